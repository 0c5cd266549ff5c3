//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Page size used by default for catalog listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page the server hands out; clients loading the whole catalog ask for this.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Pagination query parameters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// 1-based page number, defaulting to the first page.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> usize {
        (self.page() as usize - 1) * self.limit() as usize
    }
}

/// Paginated response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, query: &PageQuery, total: u64) -> Self {
        let limit = query.limit();
        Self {
            data,
            page: query.page(),
            limit,
            total,
            total_pages: total.div_ceil(u64::from(limit)) as u32,
        }
    }

    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages
    }
}

/// `{"items": [...]}` body used by the recently viewed endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemList<T> {
    pub items: Vec<T>,
}

impl<T> ItemList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

/// Response of the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_defaults_and_clamp() {
        let query = PageQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(query.offset(), 0);

        let query = PageQuery::new(0, 5000);
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), MAX_PAGE_SIZE);

        assert_eq!(PageQuery::new(3, 10).offset(), 20);
    }

    #[test]
    fn test_page_envelope_is_camel_case() {
        let page = Page::new(vec![1, 2], &PageQuery::new(1, 2), 5);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalPages"], 3);
        assert!(!page.is_last());
    }
}
