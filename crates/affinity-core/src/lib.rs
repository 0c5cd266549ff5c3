//! # Affinity Core
//!
//! The domain layer of Affinity Explorer.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! the affinity and recently viewed models, the error taxonomy, the retry
//! policy, and the ports implemented by `affinity-infra`.

pub mod domain;
pub mod error;
pub mod ports;
pub mod retry;

pub use error::{ApiError, DomainError, ErrorKind};
pub use retry::RetryPolicy;
