//! # Affinity Infrastructure
//!
//! Concrete implementations of the ports defined in `affinity-core`:
//! caches, client storage, server-side repositories, the HTTP request
//! pipeline and the recently viewed reconciler.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No network stack, storage and in-memory only
//! - `http-client` - reqwest-based request executor and remote API clients

pub mod cache;
pub mod recently_viewed;
pub mod repository;
pub mod storage;

#[cfg(feature = "http-client")]
pub mod client;

#[cfg(feature = "http-client")]
pub mod remote;

// Re-exports
pub use cache::{InMemoryCache, PersistentCache};
pub use recently_viewed::{RecentlyViewed, RecentlyViewedError};
pub use repository::{InMemoryAffinityRepository, InMemoryRecentlyViewedRepository};
pub use storage::{FileStore, MemoryStore};

#[cfg(feature = "http-client")]
pub use client::{ClientConfig, RequestExecutor, RequestOptions, ResponseBody};
#[cfg(feature = "http-client")]
pub use remote::HttpAffinityApi;
