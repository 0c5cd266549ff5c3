//! Server-side repositories.

mod memory;

pub use memory::{InMemoryAffinityRepository, InMemoryRecentlyViewedRepository};
