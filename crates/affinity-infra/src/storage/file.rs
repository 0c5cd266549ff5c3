//! File-backed client storage.
//!
//! The whole store is one JSON object on disk. Reads are served from memory;
//! every mutation rewrites the file through a temp file and a rename so a
//! crash never leaves a half-written store behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use affinity_core::ports::{KeyValueStore, StorageError};

pub struct FileStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed.
    /// A missing file is an empty store. An unreadable one is moved aside to
    /// `<path>.corrupt` and the store starts empty.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let items = match tokio::fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(items) => items,
                Err(e) => {
                    let aside = corrupt_path(&path);
                    tracing::warn!(
                        path = %path.display(),
                        moved_to = %aside.display(),
                        error = %e,
                        "Client storage is corrupt, starting empty"
                    );
                    tokio::fs::rename(&path, &aside).await?;
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), entries = items.len(), "Opened client storage");

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_vec_pretty(items)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().await;
        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&items).await {
            // Keep memory and disk in agreement.
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().await;
        let Some(previous) = items.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush(&items).await {
            items.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.items.lock().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested/storage.json"))
            .await
            .unwrap();
        assert!(store.keys().await.unwrap().is_empty());
        assert_eq!(store.get_item("x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let store = FileStore::open(&path).await.unwrap();
        store.set_item("a", "1").await.unwrap();
        store.set_item("b", "2").await.unwrap();
        store.remove_item("a").await.unwrap();
        drop(store);

        let store = FileStore::open(&path).await.unwrap();
        assert_eq!(store.get_item("a").await.unwrap(), None);
        assert_eq!(store.get_item("b").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_truncated_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let truncated = r#"{"recentlyViewedAffinities": "[{\"id\":"#;
        tokio::fs::write(&path, truncated).await.unwrap();

        let store = FileStore::open(&path).await.unwrap();
        assert!(store.keys().await.unwrap().is_empty());

        let aside = dir.path().join("storage.json.corrupt");
        assert_eq!(tokio::fs::read_to_string(&aside).await.unwrap(), truncated);

        // The fresh store is usable and persists normally.
        store.set_item("a", "1").await.unwrap();
        drop(store);
        let store = FileStore::open(&path).await.unwrap();
        assert_eq!(store.get_item("a").await.unwrap(), Some("1".to_string()));
    }
}
