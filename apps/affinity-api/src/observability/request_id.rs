//! Request ID middleware - tags every request, response and problem body with an ID.

use actix_web::{
    Error,
    body::{BoxBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderName, HeaderValue},
    middleware::Next,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::middleware::error::AppError;

/// Header name for request ID.
pub static REQUEST_ID_HEADER: &str = "x-request-id";

/// Reuses an incoming `X-Request-ID` or generates one, runs the rest of the
/// chain inside a span carrying it, and echoes it on the response. Problem
/// bodies produced by [`AppError`] get it as `request_id`.
///
/// Install with `actix_web::middleware::from_fn(request_id)`.
pub async fn request_id(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "request",
        request_id = %id,
        method = %req.method(),
        path = %req.path(),
    );

    let res = next.call(req).instrument(span).await?;

    let problem = res
        .response()
        .error()
        .and_then(|e| e.as_error::<AppError>())
        .and_then(|e| serde_json::to_vec(&e.problem().with_request_id(&id)).ok());

    // The error stays attached so outer loggers still see it.
    let mut res = match problem {
        Some(body) => res.map_body(|_, _| BoxBody::new(body)),
        None => res.map_into_boxed_body(),
    };

    let value = HeaderValue::from_str(&id).unwrap_or_else(|_| HeaderValue::from_static("unknown"));
    res.headers_mut()
        .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);

    Ok(res)
}
