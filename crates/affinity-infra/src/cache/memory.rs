//! In-memory cache implementation - volatile, lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;

use affinity_core::ports::{Cache, CacheError, Expiry};

struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// In-memory cache using a simple HashMap with async RwLock.
///
/// Each instance is independent; share one through an `Arc<dyn Cache>`.
pub struct InMemoryCache {
    store: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }

    /// Drop every expired entry now instead of waiting for a read.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|_, entry| !entry.is_expired(now));
        let purged = before - store.len();
        if purged > 0 {
            tracing::debug!(purged, "Purged expired cache entries");
        }
        purged
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let store = self.store.read().await;
        let entry = store.get(key)?;

        if entry.is_expired(Instant::now()) {
            drop(store);
            let mut store = self.store.write().await;
            // Re-check under the write lock; a concurrent set may have refreshed it.
            if store.get(key).is_some_and(|e| e.is_expired(Instant::now())) {
                store.remove(key);
            }
            return None;
        }

        Some(entry.value.clone())
    }

    async fn set(&self, key: &str, value: Value, expiry: Expiry) -> Result<(), CacheError> {
        let mut store = self.store.write().await;

        let expires_at = expiry.ttl().map(|d| Instant::now() + d);

        store.insert(key.to_string(), CacheEntry { value, expires_at });

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut store = self.store.write().await;
        store.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.store.write().await.clear();
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|key, _| !key.starts_with(prefix));
        Ok(before - store.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();
        cache.set("key1", json!("value1"), Expiry::Never).await.unwrap();
        assert_eq!(cache.get("key1").await, Some(json!("value1")));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();
        cache.set("key1", json!(1), Expiry::Never).await.unwrap();
        cache.delete("key1").await.unwrap();
        assert_eq!(cache.get("key1").await, None);
    }

    #[tokio::test]
    async fn test_missing_key_is_absent() {
        let cache = InMemoryCache::new();
        assert_eq!(cache.get("nope").await, None);
        assert!(!cache.exists("nope").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_and_is_evicted() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(2);
        cache.set("k", json!({ "a": 1 }), ttl.into()).await.unwrap();

        assert_eq!(cache.get("k").await, Some(json!({ "a": 1 })));

        tokio::time::sleep(ttl + Duration::from_millis(1)).await;
        assert_eq!(cache.get("k").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_expiry_is_five_minutes() {
        let cache = InMemoryCache::new();
        cache.set("k", json!(true), Expiry::Default).await.unwrap();

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(cache.exists("k").await);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!cache.exists("k").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_keeps_live_entries() {
        let cache = InMemoryCache::new();
        cache
            .set("short", json!(1), Duration::from_secs(1).into())
            .await
            .unwrap();
        cache.set("forever", json!(2), Expiry::Never).await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_clear_and_batch_helpers() {
        let cache = InMemoryCache::new();
        cache.set("a", json!(1), Expiry::Never).await.unwrap();
        cache.set("b", json!(2), Expiry::Never).await.unwrap();

        assert_eq!(
            cache.get_many(&["a", "b", "c"]).await,
            vec![Some(json!(1)), Some(json!(2)), None]
        );

        cache.delete_many(&["a"]).await.unwrap();
        assert!(!cache.exists("a").await);

        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_many_then_delete_prefix() {
        let cache = InMemoryCache::new();
        cache
            .set_many(&[
                ("affinities:page=1", json!([1]), Expiry::Never),
                ("affinities:page=2", json!([2]), Duration::from_secs(1).into()),
                ("health", json!("ok"), Expiry::Default),
            ])
            .await
            .unwrap();

        assert_eq!(cache.get("affinities:page=1").await, Some(json!([1])));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(cache.get("affinities:page=2").await, None);

        cache.set("affinities:page=2", json!([2]), Expiry::Never).await.unwrap();
        assert_eq!(cache.delete_prefix("affinities:").await.unwrap(), 2);
        assert_eq!(cache.len().await, 1);
        assert!(cache.exists("health").await);
    }
}
