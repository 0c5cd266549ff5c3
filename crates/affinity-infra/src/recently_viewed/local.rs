//! Recently viewed list kept in client storage for anonymous browsing.

use std::sync::Arc;

use affinity_core::domain::{RecentlyViewedEntry, record_view};
use affinity_core::ports::{KeyValueStore, StorageError};

/// Storage key holding the JSON array of entries.
pub const RECENTLY_VIEWED_KEY: &str = "recentlyViewedAffinities";

#[derive(Clone)]
pub struct LocalRecentlyViewed {
    store: Arc<dyn KeyValueStore>,
}

impl LocalRecentlyViewed {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored list; missing or unreadable data reads as empty.
    pub async fn load(&self) -> Result<Vec<RecentlyViewedEntry>, StorageError> {
        let Some(raw) = self.store.get_item(RECENTLY_VIEWED_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(list) => Ok(list),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring corrupt recently viewed list");
                Ok(Vec::new())
            }
        }
    }

    pub async fn save(&self, list: &[RecentlyViewedEntry]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(list).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        self.store.set_item(RECENTLY_VIEWED_KEY, &raw).await
    }

    /// Prepend `entry` (deduplicated, capped) and persist. Returns the new list.
    pub async fn add(
        &self,
        entry: RecentlyViewedEntry,
    ) -> Result<Vec<RecentlyViewedEntry>, StorageError> {
        let mut list = self.load().await?;
        record_view(&mut list, entry);
        self.save(&list).await?;
        Ok(list)
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.remove_item(RECENTLY_VIEWED_KEY).await
    }
}
