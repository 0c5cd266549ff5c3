//! Bounded retry with capped exponential backoff.

use std::future::Future;

use affinity_core::ApiError;
use affinity_core::retry::RetryPolicy;

/// Run `operation` until it succeeds, fails with a non-retryable kind, or
/// `policy.max_attempts` attempts have been made.
///
/// Non-retryable errors are returned at once without waiting. After failed
/// attempt `n` (0-based) the controller sleeps `policy.delay_for(n)`.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let max_attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !policy.is_retryable(err.kind) {
            return Err(err);
        }

        let delay = policy.delay_for(attempt);
        attempt += 1;
        if attempt >= max_attempts {
            return Err(err);
        }

        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            kind = %err.kind,
            "Request failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
