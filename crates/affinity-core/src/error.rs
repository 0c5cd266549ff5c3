//! Error taxonomy shared by the client pipeline and its callers.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of failure categories surfaced by the request pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    #[serde(rename = "TIMEOUT_ERROR")]
    Timeout,
    #[serde(rename = "SERVER_ERROR")]
    Server,
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(rename = "AUTHENTICATION_ERROR")]
    Authentication,
    #[serde(rename = "AUTHORIZATION_ERROR")]
    Authorization,
    #[serde(rename = "NOT_FOUND_ERROR")]
    NotFound,
    #[serde(rename = "UNKNOWN_ERROR")]
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Timeout => "TIMEOUT_ERROR",
            ErrorKind::Server => "SERVER_ERROR",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Authentication => "AUTHENTICATION_ERROR",
            ErrorKind::Authorization => "AUTHORIZATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an HTTP status code to an error kind.
pub fn classify(status: u16) -> ErrorKind {
    match status {
        400 => ErrorKind::Validation,
        401 => ErrorKind::Authentication,
        403 => ErrorKind::Authorization,
        404 => ErrorKind::NotFound,
        500 => ErrorKind::Server,
        _ => ErrorKind::Unknown,
    }
}

/// Normalized error returned by every client-side request.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status, `Some(0)` for transport-level failures.
    pub status: Option<u16>,
    pub payload: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            payload: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

/// Raw failure produced by a pipeline stage before normalization.
#[derive(Debug)]
pub enum Failure {
    /// Already normalized; passes through unchanged.
    Api(ApiError),
    /// The transport could not reach the server.
    Network(String),
    /// The timeout race fired before a response arrived.
    Timeout(Duration),
    /// The server answered with a non-2xx status.
    Status {
        status: u16,
        body: Option<serde_json::Value>,
    },
    Other(String),
}

impl From<ApiError> for Failure {
    fn from(err: ApiError) -> Self {
        Failure::Api(err)
    }
}

/// Convert any raw failure into an [`ApiError`].
pub fn normalize(failure: Failure) -> ApiError {
    match failure {
        Failure::Api(err) => err,
        Failure::Network(cause) => ApiError::new(
            ErrorKind::Network,
            "Network error occurred. Please check your connection.",
        )
        .with_status(0)
        .with_payload(serde_json::json!({ "cause": cause })),
        Failure::Timeout(after) => ApiError::new(
            ErrorKind::Timeout,
            format!("Request timed out after {}ms", after.as_millis()),
        )
        .with_status(0),
        Failure::Status { status, body } => {
            let err = ApiError::new(classify(status), format!("HTTP error! status: {status}"))
                .with_status(status);
            match body {
                Some(body) => err.with_payload(body),
                None => err,
            }
        }
        Failure::Other(message) => {
            let message = if message.is_empty() {
                "An unexpected error occurred".to_string()
            } else {
                message
            };
            ApiError::new(ErrorKind::Unknown, message).with_status(500)
        }
    }
}

/// Domain errors raised by the server-side services.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Storage backend failed: {0}")]
    Backend(String),
}
