use async_trait::async_trait;

use crate::domain::{Affinity, AffinityId, RecentlyViewedEntry, UserId};
use crate::error::RepoError;

/// Server-side storage of per-user recently viewed lists.
#[async_trait]
pub trait RecentlyViewedRepository: Send + Sync {
    /// Stored list for `user`; empty when the user has none.
    async fn find_by_user(&self, user: &UserId) -> Result<Vec<RecentlyViewedEntry>, RepoError>;

    /// Replace the stored list for `user`.
    async fn save(&self, user: &UserId, entries: Vec<RecentlyViewedEntry>)
    -> Result<(), RepoError>;
}

/// Affinity catalog storage.
#[async_trait]
pub trait AffinityRepository: Send + Sync {
    async fn find_by_id(&self, id: &AffinityId) -> Result<Option<Affinity>, RepoError>;

    /// Catalog slice starting at `offset`, plus the total count.
    async fn find_page(&self, offset: usize, limit: usize)
    -> Result<(Vec<Affinity>, usize), RepoError>;
}
