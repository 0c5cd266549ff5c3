//! Request executor - timeout race, response parsing, error normalization,
//! retry and caching composed into one call.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use affinity_core::error::{Failure, normalize};
use affinity_core::ports::{Cache, CacheError, Expiry, request_cache_key};
use affinity_core::{ApiError, ErrorKind, RetryPolicy};

use super::options::{ClientConfig, RequestOptions};
use super::report::report;
use super::retry::run_with_retry;

/// Parsed body of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "body", rename_all = "lowercase")]
pub enum ResponseBody {
    /// The response declared a JSON content type.
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Json(_) => None,
            ResponseBody::Text(text) => Some(text),
        }
    }

    /// Decode into `T`. Text bodies are tried as JSON as well.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let decoded = match self {
            ResponseBody::Json(value) => serde_json::from_value(value),
            ResponseBody::Text(text) => serde_json::from_str(&text),
        };
        decoded.map_err(|e| {
            ApiError::new(
                ErrorKind::Validation,
                format!("Unexpected response shape: {e}"),
            )
        })
    }
}

/// HTTP request executor with injected cache and retry policy.
#[derive(Clone)]
pub struct RequestExecutor {
    http: reqwest::Client,
    base_url: String,
    defaults: RequestOptions,
    retry: RetryPolicy,
    cache: Option<Arc<dyn Cache>>,
}

impl RequestExecutor {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            defaults: config.request_defaults(),
            retry: RetryPolicy::default().with_base_delay(config.retry_base_delay),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Backoff schedule and retryable kinds. The attempt ceiling still comes
    /// from each request's `retry_count`.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fresh options seeded with this executor's defaults.
    pub fn options(&self) -> RequestOptions {
        self.defaults.clone()
    }

    /// Absolute targets are used as-is; anything else is joined to the base URL.
    pub fn url(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            format!("{}/{}", self.base_url, target.trim_start_matches('/'))
        }
    }

    /// Base URL extended with `segments`, each percent-encoded as one path segment.
    pub fn segments_url(&self, segments: &[&str]) -> Result<String, ApiError> {
        let invalid = |detail: String| ApiError::new(ErrorKind::Validation, detail);

        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("Invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("Base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    /// Drop every cached GET response for `target` and the paths beneath it,
    /// whatever their query.
    pub async fn invalidate(&self, target: &str) -> Result<usize, CacheError> {
        let Some(cache) = &self.cache else {
            return Ok(0);
        };
        let url = self.url(target);
        let removed = cache
            .delete_prefix(&request_cache_key(Method::GET.as_str(), &url, &[]))
            .await?;
        tracing::debug!(url = %url, removed, "Invalidated cached responses");
        Ok(removed)
    }

    /// Run the full pipeline for one request.
    pub async fn execute(
        &self,
        target: &str,
        options: RequestOptions,
    ) -> Result<ResponseBody, ApiError> {
        let url = self.url(target);
        let context = log_context(&url, &options);

        let cache = self.cache.as_ref().filter(|_| is_cacheable(&options));
        let cache_key = request_cache_key(options.method.as_str(), &url, &options.query);

        if let Some(cache) = cache {
            if let Some(hit) = cache.get(&cache_key).await {
                match serde_json::from_value::<ResponseBody>(hit) {
                    Ok(body) => {
                        tracing::debug!(url = %url, "Cache hit");
                        return Ok(body);
                    }
                    Err(e) => tracing::warn!(url = %url, error = %e, "Ignoring unreadable cache entry"),
                }
            }
        }

        let headers = build_headers(options.headers()).map_err(|e| report(e, &context))?;
        let policy = self.retry.clone().with_max_attempts(options.retry_count);

        let body = run_with_retry(&policy, || {
            let request = self.build_request(&url, &options, headers.clone());
            let timeout = options.timeout;
            async move { send_with_timeout(request, timeout).await.map_err(normalize) }
        })
        .await
        .map_err(|e| report(e, &context))?;

        if let Some(cache) = cache {
            match serde_json::to_value(&body) {
                Ok(value) => {
                    if let Err(e) = cache
                        .set(&cache_key, value, Expiry::After(options.cache_ttl))
                        .await
                    {
                        tracing::warn!(url = %url, error = %e, "Failed to cache response");
                    }
                }
                Err(e) => tracing::warn!(url = %url, error = %e, "Response not cacheable"),
            }
        }

        Ok(body)
    }

    /// Execute and decode the body into `T`.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        target: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.url(target);
        let context = log_context(&url, &options);
        self.execute(target, options)
            .await?
            .decode()
            .map_err(|e| report(e, &context))
    }

    pub async fn get(&self, target: &str) -> Result<ResponseBody, ApiError> {
        self.execute(target, self.options()).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        target: &str,
        body: &B,
    ) -> Result<ResponseBody, ApiError> {
        self.execute(target, self.with_body(Method::POST, body)?).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        target: &str,
        body: &B,
    ) -> Result<ResponseBody, ApiError> {
        self.execute(target, self.with_body(Method::PUT, body)?).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        target: &str,
        body: &B,
    ) -> Result<ResponseBody, ApiError> {
        self.execute(target, self.with_body(Method::PATCH, body)?).await
    }

    pub async fn delete(&self, target: &str) -> Result<ResponseBody, ApiError> {
        self.execute(target, self.options().method(Method::DELETE))
            .await
    }

    fn with_body<B: Serialize + ?Sized>(
        &self,
        method: Method,
        body: &B,
    ) -> Result<RequestOptions, ApiError> {
        self.options().method(method).json(body).map_err(|e| {
            report(
                ApiError::new(ErrorKind::Validation, format!("Unserializable body: {e}")),
                &Value::Null,
            )
        })
    }

    fn build_request(
        &self,
        url: &str,
        options: &RequestOptions,
        headers: HeaderMap,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .request(options.method.clone(), url)
            .headers(headers);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = &options.body {
            request = request.body(body.to_string());
        }
        request
    }
}

fn is_cacheable(options: &RequestOptions) -> bool {
    options.use_cache && (options.method == Method::GET || options.method == Method::HEAD)
}

fn log_context(url: &str, options: &RequestOptions) -> Value {
    let mut context = options.context.clone();
    context.insert("method".into(), options.method.as_str().into());
    context.insert("url".into(), url.into());
    Value::Object(context)
}

fn build_headers(
    headers: &std::collections::BTreeMap<String, String>,
) -> Result<HeaderMap, ApiError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ApiError::new(ErrorKind::Validation, format!("Invalid header name {name}: {e}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ApiError::new(ErrorKind::Validation, format!("Invalid header value: {e}"))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Race send-and-parse against a timer. When the timer wins the request
/// future is dropped, which abandons the connection.
async fn send_with_timeout(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<ResponseBody, Failure> {
    let exchange = async {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Failure::Timeout(timeout)
            } else if e.is_builder() {
                Failure::Other(e.to_string())
            } else {
                Failure::Network(e.to_string())
            }
        })?;
        parse_response(response).await
    };

    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(Failure::Timeout(timeout)),
    }
}

/// Non-2xx becomes a status failure; 2xx bodies are JSON when declared so,
/// otherwise raw text.
async fn parse_response(response: reqwest::Response) -> Result<ResponseBody, Failure> {
    let status = response.status();

    if !status.is_success() {
        let body = response.bytes().await.ok().and_then(|bytes| {
            if bytes.is_empty() {
                None
            } else {
                serde_json::from_slice(&bytes)
                    .ok()
                    .or_else(|| Some(Value::String(String::from_utf8_lossy(&bytes).into_owned())))
            }
        });
        return Err(Failure::Status {
            status: status.as_u16(),
            body,
        });
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    let text = response
        .text()
        .await
        .map_err(|e| Failure::Network(e.to_string()))?;

    if is_json {
        serde_json::from_str(&text)
            .map(ResponseBody::Json)
            .map_err(|e| Failure::Other(format!("Invalid JSON response: {e}")))
    } else {
        Ok(ResponseBody::Text(text))
    }
}
