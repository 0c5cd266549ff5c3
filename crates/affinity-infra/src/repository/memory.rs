//! In-memory repositories backing the API server.
//! Note: recently viewed lists are lost on server restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use affinity_core::domain::{Affinity, AffinityId, RecentlyViewedEntry, UserId};
use affinity_core::error::RepoError;
use affinity_core::ports::{AffinityRepository, RecentlyViewedRepository};

/// Per-user recently viewed lists keyed by user id.
#[derive(Default)]
pub struct InMemoryRecentlyViewedRepository {
    lists: RwLock<HashMap<UserId, Vec<RecentlyViewedEntry>>>,
}

impl InMemoryRecentlyViewedRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecentlyViewedRepository for InMemoryRecentlyViewedRepository {
    async fn find_by_user(&self, user: &UserId) -> Result<Vec<RecentlyViewedEntry>, RepoError> {
        Ok(self
            .lists
            .read()
            .await
            .get(user)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(
        &self,
        user: &UserId,
        entries: Vec<RecentlyViewedEntry>,
    ) -> Result<(), RepoError> {
        self.lists.write().await.insert(user.clone(), entries);
        Ok(())
    }
}

/// Read-only affinity catalog held in catalog order.
pub struct InMemoryAffinityRepository {
    affinities: Vec<Affinity>,
}

impl InMemoryAffinityRepository {
    pub fn new(affinities: Vec<Affinity>) -> Self {
        Self { affinities }
    }

    /// Parse a catalog from a JSON array of affinities.
    pub fn from_json(raw: &str) -> Result<Self, RepoError> {
        let affinities: Vec<Affinity> =
            serde_json::from_str(raw).map_err(|e| RepoError::Backend(e.to_string()))?;
        Ok(Self::new(affinities))
    }

    pub fn len(&self) -> usize {
        self.affinities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.affinities.is_empty()
    }
}

#[async_trait]
impl AffinityRepository for InMemoryAffinityRepository {
    async fn find_by_id(&self, id: &AffinityId) -> Result<Option<Affinity>, RepoError> {
        Ok(self.affinities.iter().find(|a| &a.id == id).cloned())
    }

    async fn find_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Affinity>, usize), RepoError> {
        let page = self
            .affinities
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, self.affinities.len()))
    }
}
