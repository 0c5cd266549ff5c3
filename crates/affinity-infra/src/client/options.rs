//! Request options and client configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use affinity_core::ports::DEFAULT_TTL;
use affinity_core::retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_API_URL: &str = "http://localhost:4000/api";

/// Per-request settings. Start from [`RequestOptions::default`] or
/// [`RequestExecutor::options`](super::RequestExecutor::options) and override.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Lowercased names; only [`RequestOptions::header`] writes here so later
    /// writes always replace earlier ones.
    headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
    /// Maximum number of attempts, the first one included.
    pub retry_count: u32,
    pub use_cache: bool,
    pub cache_ttl: Duration,
    /// Extra fields attached to the error log when the request fails.
    pub context: serde_json::Map<String, Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        Self {
            method: Method::GET,
            headers,
            query: Vec::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
            retry_count: DEFAULT_MAX_ATTEMPTS,
            use_cache: true,
            cache_ttl: DEFAULT_TTL,
            context: serde_json::Map::new(),
        }
    }
}

impl RequestOptions {
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Client configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL that relative request targets are joined to.
    pub base_url: String,
    pub timeout: Duration,
    pub retry_count: u32,
    pub retry_base_delay: Duration,
    pub use_cache: bool,
    pub cache_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry_count: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay: DEFAULT_BASE_DELAY,
            use_cache: true,
            cache_ttl: DEFAULT_TTL,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("AFFINITY_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            timeout: Duration::from_millis(
                std::env::var("AFFINITY_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30_000),
            ),
            retry_count: std::env::var("AFFINITY_RETRY_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            retry_base_delay: Duration::from_millis(
                std::env::var("AFFINITY_RETRY_BASE_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            use_cache: std::env::var("AFFINITY_USE_CACHE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            cache_ttl: Duration::from_secs(
                std::env::var("AFFINITY_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        }
    }

    /// Request defaults derived from this configuration.
    pub fn request_defaults(&self) -> RequestOptions {
        RequestOptions {
            timeout: self.timeout,
            retry_count: self.retry_count,
            use_cache: self.use_cache,
            cache_ttl: self.cache_ttl,
            ..RequestOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let options = RequestOptions::default();
        assert_eq!(options.method, Method::GET);
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.retry_count, 3);
        assert!(options.use_cache);
        assert_eq!(options.cache_ttl, Duration::from_secs(300));
        assert_eq!(options.headers()["content-type"], "application/json");
    }

    #[test]
    fn test_caller_header_overrides_default() {
        let options = RequestOptions::default().header("Content-Type", "text/plain");
        assert_eq!(options.headers().len(), 1);
        assert_eq!(options.headers()["content-type"], "text/plain");

        let options = options.header("CONTENT-TYPE", "application/xml");
        assert_eq!(options.headers().len(), 1);
        assert_eq!(options.headers()["content-type"], "application/xml");
    }
}
