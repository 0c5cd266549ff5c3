//! Remote ports implemented over the request executor.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;

use affinity_core::{ApiError, ErrorKind};
use affinity_core::domain::{Affinity, AffinityId, RecentlyViewedEntry, UserId};
use affinity_core::ports::{AffinityCatalog, RecentlyViewedRemote};
use affinity_shared::dto::MAX_PAGE_SIZE;
use affinity_shared::{ItemList, Page};

use crate::client::{RequestExecutor, report};

/// Client for the affinity catalog and recently viewed endpoints.
#[derive(Clone)]
pub struct HttpAffinityApi {
    executor: Arc<RequestExecutor>,
}

impl HttpAffinityApi {
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Absolute URL with ids escaped, so `a/b` stays one path segment.
    fn url(&self, segments: &[&str]) -> Result<String, ApiError> {
        self.executor
            .segments_url(segments)
            .map_err(|e| report(e, &serde_json::Value::Null))
    }

    fn recently_viewed_url(&self, user: &UserId) -> Result<String, ApiError> {
        self.url(&["users", user.as_str(), "recently-viewed"])
    }
}

#[async_trait]
impl RecentlyViewedRemote for HttpAffinityApi {
    async fn fetch(&self, user: &UserId) -> Result<Vec<RecentlyViewedEntry>, ApiError> {
        // Always authoritative: never served from cache.
        let options = self
            .executor
            .options()
            .use_cache(false)
            .context("user", user.as_str());
        let list: ItemList<RecentlyViewedEntry> = self
            .executor
            .execute_json(&self.recently_viewed_url(user)?, options)
            .await?;
        Ok(list.items)
    }

    async fn add(&self, user: &UserId, entry: &RecentlyViewedEntry) -> Result<(), ApiError> {
        self.executor
            .post(&self.recently_viewed_url(user)?, entry)
            .await?;
        Ok(())
    }

    async fn merge(
        &self,
        user: &UserId,
        local: &[RecentlyViewedEntry],
    ) -> Result<Vec<RecentlyViewedEntry>, ApiError> {
        let options = self
            .executor
            .options()
            .method(Method::POST)
            .context("user", user.as_str())
            .json(&ItemList::new(local.to_vec()))
            .map_err(|e| {
                report(
                    ApiError::new(ErrorKind::Validation, format!("Unserializable body: {e}")),
                    &serde_json::Value::Null,
                )
            })?;
        let merged: ItemList<RecentlyViewedEntry> = self
            .executor
            .execute_json(
                &self.url(&["users", user.as_str(), "recently-viewed", "merge"])?,
                options,
            )
            .await?;
        Ok(merged.items)
    }
}

#[async_trait]
impl AffinityCatalog for HttpAffinityApi {
    async fn list_all(&self) -> Result<Vec<Affinity>, ApiError> {
        let mut affinities = Vec::new();
        let mut page_number = 1u32;

        loop {
            let options = self
                .executor
                .options()
                .query("page", page_number)
                .query("limit", MAX_PAGE_SIZE);
            let page: Page<Affinity> = self.executor.execute_json("/affinities", options).await?;
            let last = page.is_last() || page.data.is_empty();
            affinities.extend(page.data);
            if last {
                break;
            }
            page_number += 1;
        }

        tracing::debug!(count = affinities.len(), "Loaded affinity catalog");
        Ok(affinities)
    }

    async fn get(&self, id: &AffinityId) -> Result<Affinity, ApiError> {
        self.executor
            .execute_json(&self.url(&["affinities", id.as_str()])?, self.executor.options())
            .await
    }
}
