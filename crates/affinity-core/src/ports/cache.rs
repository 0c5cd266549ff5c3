use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// TTL applied when the caller does not pick one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Prefix shared by every key the request pipeline writes.
pub const CACHE_KEY_PREFIX: &str = "affinity_explorer_";

/// How long a cache entry lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// [`DEFAULT_TTL`].
    #[default]
    Default,
    After(Duration),
    Never,
}

impl Expiry {
    /// Concrete time-to-live, `None` for entries that never expire.
    pub fn ttl(self) -> Option<Duration> {
        match self {
            Expiry::Default => Some(DEFAULT_TTL),
            Expiry::After(ttl) => Some(ttl),
            Expiry::Never => None,
        }
    }
}

impl From<Duration> for Expiry {
    fn from(ttl: Duration) -> Self {
        Expiry::After(ttl)
    }
}

/// Cache trait - abstraction over volatile and persistent backends.
///
/// Expired entries read as absent and are evicted by the read that finds them.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a value from the cache.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Set a value in the cache.
    async fn set(&self, key: &str, value: Value, expiry: Expiry) -> Result<(), CacheError>;

    /// Delete a key from the cache.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every entry owned by this cache.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Remove every entry whose key starts with `prefix`, returning how many went.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError>;

    /// Check if a key exists.
    async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    async fn get_many(&self, keys: &[&str]) -> Vec<Option<Value>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await);
        }
        values
    }

    /// Store several entries, stopping at the first failure.
    async fn set_many(&self, entries: &[(&str, Value, Expiry)]) -> Result<(), CacheError> {
        for (key, value, expiry) in entries {
            self.set(key, value.clone(), *expiry).await?;
        }
        Ok(())
    }

    async fn delete_many(&self, keys: &[&str]) -> Result<(), CacheError> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }
}

/// Build a request cache key: prefix, method, url and sorted query params.
pub fn request_cache_key(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();
    let query = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    if query.is_empty() {
        format!("{CACHE_KEY_PREFIX}{method} {url}")
    } else {
        format!("{CACHE_KEY_PREFIX}{method} {url}?{query}")
    }
}

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Storage failed: {0}")]
    Storage(#[from] super::StorageError),
}
