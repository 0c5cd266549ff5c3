//! Application state - shared across all handlers.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;

use affinity_core::ports::{AffinityRepository, RecentlyViewedRepository};
use affinity_infra::repository::{InMemoryAffinityRepository, InMemoryRecentlyViewedRepository};

use crate::config::AppConfig;

/// Catalog served when no `AFFINITY_CATALOG_PATH` is configured.
const BUNDLED_CATALOG: &str = include_str!("../data/affinities.json");

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub affinities: Arc<dyn AffinityRepository>,
    pub recently_viewed: Arc<dyn RecentlyViewedRepository>,
    /// Serializes read-modify-write cycles on recently viewed lists.
    pub list_writes: Arc<Mutex<()>>,
    pub catalog_size: usize,
}

impl AppState {
    /// Build the application state from configuration.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let raw = match &config.catalog_path {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading catalog {}", path.display()))?,
            None => BUNDLED_CATALOG.to_string(),
        };

        let catalog = InMemoryAffinityRepository::from_json(&raw).context("parsing catalog")?;
        tracing::info!(affinities = catalog.len(), "Affinity catalog loaded");

        Ok(Self::with_catalog(catalog))
    }

    pub fn with_catalog(catalog: InMemoryAffinityRepository) -> Self {
        Self {
            catalog_size: catalog.len(),
            affinities: Arc::new(catalog),
            recently_viewed: Arc::new(InMemoryRecentlyViewedRepository::new()),
            list_writes: Arc::new(Mutex::new(())),
        }
    }

    /// State over the bundled catalog.
    #[cfg(test)]
    pub fn bundled() -> Self {
        let catalog = InMemoryAffinityRepository::from_json(BUNDLED_CATALOG)
            .expect("bundled catalog is valid JSON");
        Self::with_catalog(catalog)
    }
}
