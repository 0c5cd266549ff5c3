//! # Affinity Shared
//!
//! Wire types shared by the API server and its clients.
//! Kept free of domain and framework dependencies so any client can use it.

pub mod dto;
pub mod response;

pub use dto::{ItemList, Page, PageQuery};
pub use response::ErrorResponse;
