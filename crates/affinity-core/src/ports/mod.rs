//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod cache;
mod remote;
mod repository;
mod storage;

pub use cache::{CACHE_KEY_PREFIX, Cache, CacheError, DEFAULT_TTL, Expiry, request_cache_key};
pub use remote::{AffinityCatalog, RecentlyViewedRemote};
pub use repository::{AffinityRepository, RecentlyViewedRepository};
pub use storage::{KeyValueStore, StorageError};
