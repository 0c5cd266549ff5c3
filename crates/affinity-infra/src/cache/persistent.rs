//! Persistent cache layered over client storage - survives process restart.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use affinity_core::ports::{Cache, CacheError, Expiry, KeyValueStore};

/// Namespace prepended to every key this cache writes into storage.
pub const PERSISTENT_CACHE_NAMESPACE: &str = "affinity_explorer_cache:";

/// Stored shape: `{"value": ..., "expiration": <unix ms> | null}`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    value: Value,
    expiration: Option<i64>,
}

impl StoredEntry {
    fn is_expired(&self, now_ms: i64) -> bool {
        self.expiration.is_some_and(|exp| now_ms >= exp)
    }
}

/// Cache backed by a [`KeyValueStore`].
///
/// Expiry uses wall-clock milliseconds since the entry must stay valid across
/// restarts. Unreadable entries are logged, removed and reported as absent.
pub struct PersistentCache {
    store: Arc<dyn KeyValueStore>,
}

impl PersistentCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn storage_key(key: &str) -> String {
        format!("{PERSISTENT_CACHE_NAMESPACE}{key}")
    }

    async fn evict(&self, storage_key: &str) {
        if let Err(e) = self.store.remove_item(storage_key).await {
            tracing::warn!(key = %storage_key, error = %e, "Failed to evict cache entry");
        }
    }
}

#[async_trait]
impl Cache for PersistentCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let storage_key = Self::storage_key(key);

        let raw = match self.store.get_item(&storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read from storage");
                return None;
            }
        };

        let entry: StoredEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding corrupt cache entry");
                self.evict(&storage_key).await;
                return None;
            }
        };

        if entry.is_expired(Utc::now().timestamp_millis()) {
            self.evict(&storage_key).await;
            return None;
        }

        Some(entry.value)
    }

    async fn set(&self, key: &str, value: Value, expiry: Expiry) -> Result<(), CacheError> {
        let expiration = expiry.ttl().map(|ttl| {
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            Utc::now().timestamp_millis().saturating_add(ttl_ms)
        });

        let raw = serde_json::to_string(&StoredEntry { value, expiration })
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        self.store.set_item(&Self::storage_key(key), &raw).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.remove_item(&Self::storage_key(key)).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        // Only our namespace; the recently viewed list shares the store.
        self.delete_prefix("").await?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let namespaced = Self::storage_key(prefix);
        let mut removed = 0;
        for key in self.store.keys().await? {
            if key.starts_with(&namespaced) {
                self.store.remove_item(&key).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = PersistentCache::new(Arc::new(MemoryStore::new()));
        cache
            .set("affinities", json!([{ "id": "aff1" }]), Expiry::Default)
            .await
            .unwrap();
        assert_eq!(cache.get("affinities").await, Some(json!([{ "id": "aff1" }])));
    }

    #[tokio::test]
    async fn test_stored_shape() {
        let store = Arc::new(MemoryStore::new());
        let cache = PersistentCache::new(store.clone());
        cache.set("k", json!("v"), Expiry::Never).await.unwrap();

        let raw = store
            .get_item("affinity_explorer_cache:k")
            .await
            .unwrap()
            .unwrap();
        let stored: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, json!({ "value": "v", "expiration": null }));
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent_and_removed() {
        let store = Arc::new(MemoryStore::new());
        let cache = PersistentCache::new(store.clone());
        cache
            .set("k", json!(1), Duration::from_millis(20).into())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await, None);
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_item("affinity_explorer_cache:bad", "{not json")
            .await
            .unwrap();

        let cache = PersistentCache::new(store.clone());
        assert_eq!(cache.get("bad").await, None);
        assert_eq!(store.get_item("affinity_explorer_cache:bad").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_leaves_foreign_keys() {
        let store = Arc::new(MemoryStore::new());
        store.set_item("recentlyViewedAffinities", "[]").await.unwrap();

        let cache = PersistentCache::new(store.clone());
        cache.set("a", json!(1), Expiry::Never).await.unwrap();
        cache.clear().await.unwrap();

        assert_eq!(cache.get("a").await, None);
        assert_eq!(store.keys().await.unwrap(), vec!["recentlyViewedAffinities".to_string()]);
    }

    #[tokio::test]
    async fn test_survives_reopening_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        {
            let store = FileStore::open(&path).await.unwrap();
            let cache = PersistentCache::new(Arc::new(store));
            cache
                .set("catalog", json!({ "total": 8 }), Expiry::Default)
                .await
                .unwrap();
        }

        let reopened = FileStore::open(&path).await.unwrap();
        let cache = PersistentCache::new(Arc::new(reopened));
        assert_eq!(cache.get("catalog").await, Some(json!({ "total": 8 })));
    }

    #[tokio::test]
    async fn test_delete_prefix_stays_in_namespace() {
        let store = Arc::new(MemoryStore::new());
        store.set_item("users/u1", "kept").await.unwrap();

        let cache = PersistentCache::new(store.clone());
        cache
            .set_many(&[
                ("users/u1", json!(1), Expiry::Never),
                ("users/u2", json!(2), Expiry::Never),
                ("affinities", json!(3), Expiry::Never),
            ])
            .await
            .unwrap();

        assert_eq!(cache.delete_prefix("users/").await.unwrap(), 2);
        assert_eq!(cache.get("users/u1").await, None);
        assert_eq!(cache.get("affinities").await, Some(json!(3)));
        assert_eq!(store.get_item("users/u1").await.unwrap(), Some("kept".to_string()));
    }
}
