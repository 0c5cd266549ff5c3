//! HTTP request pipeline.
//!
//! Stages, composed by plain function calls inside [`RequestExecutor::execute`]:
//! cache lookup, timeout race, response parsing, normalization, retry,
//! cache fill. Every error that leaves the executor is an [`ApiError`]
//! and has been logged.
//!
//! [`ApiError`]: affinity_core::ApiError

mod executor;
mod options;
mod report;
pub mod retry;

pub use executor::{RequestExecutor, ResponseBody};
pub use options::{ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT, RequestOptions};
pub use report::report;
pub use retry::run_with_retry;
