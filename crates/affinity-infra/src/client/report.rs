//! Error reporting - every normalized error is logged before it reaches a caller.

use chrono::Utc;
use serde_json::Value;

use affinity_core::ApiError;

/// Log `err` with a timestamp, its serialized fields and the caller context,
/// then hand it back. Never fails.
pub fn report(err: ApiError, context: &Value) -> ApiError {
    let fields = serde_json::to_string(&err).unwrap_or_else(|_| err.to_string());

    tracing::error!(
        timestamp = %Utc::now().to_rfc3339(),
        kind = %err.kind,
        status = ?err.status,
        error = %fields,
        context = %context,
        "{}",
        err.message
    );

    err
}
