//! Cache implementations - volatile in-memory and storage-backed persistent.

mod memory;
mod persistent;

pub use memory::InMemoryCache;
pub use persistent::{PERSISTENT_CACHE_NAMESPACE, PersistentCache};
