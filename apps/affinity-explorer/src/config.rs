//! Client configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use affinity_infra::ClientConfig;

/// Where local state lives unless `AFFINITY_DATA_DIR` says otherwise.
pub const DEFAULT_DATA_DIR: &str = ".affinity-explorer";

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub client: ClientConfig,
    /// Holds `storage.json`: the anonymous list and the response cache.
    pub data_dir: PathBuf,
}

impl ExplorerConfig {
    pub fn from_env() -> Self {
        Self {
            client: ClientConfig::from_env(),
            data_dir: env::var("AFFINITY_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }
}
