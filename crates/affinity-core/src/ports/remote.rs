use async_trait::async_trait;

use crate::domain::{Affinity, AffinityId, RecentlyViewedEntry, UserId};
use crate::error::ApiError;

/// Server-side recently viewed list, as seen from the client.
#[async_trait]
pub trait RecentlyViewedRemote: Send + Sync {
    /// Current list for `user`, most recent first.
    async fn fetch(&self, user: &UserId) -> Result<Vec<RecentlyViewedEntry>, ApiError>;

    /// Record one view for `user`.
    async fn add(&self, user: &UserId, entry: &RecentlyViewedEntry) -> Result<(), ApiError>;

    /// Fold a client-side list into the server list and return the result.
    async fn merge(
        &self,
        user: &UserId,
        local: &[RecentlyViewedEntry],
    ) -> Result<Vec<RecentlyViewedEntry>, ApiError>;
}

/// Read access to the affinity catalog.
#[async_trait]
pub trait AffinityCatalog: Send + Sync {
    /// The whole catalog, in catalog order.
    async fn list_all(&self) -> Result<Vec<Affinity>, ApiError>;

    async fn get(&self, id: &AffinityId) -> Result<Affinity, ApiError>;
}
