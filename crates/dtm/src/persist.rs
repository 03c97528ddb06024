//! JSON snapshot persistence of a [`MemoryStore`].

use dtm_core::StoreError;
use dtm_store::{MemoryStore, StoreSnapshot};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Cannot access store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid store snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Load the store at `path`. A missing file is an empty store.
pub fn load_store(path: &Path) -> Result<MemoryStore, PersistError> {
    if !path.exists() {
        debug!(path = %path.display(), "No store snapshot; starting empty");
        return Ok(MemoryStore::new());
    }
    let content = std::fs::read_to_string(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: StoreSnapshot =
        serde_json::from_str(&content).map_err(|source| PersistError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(MemoryStore::from_snapshot(snapshot))
}

pub fn save_store(store: &MemoryStore, path: &Path) -> Result<(), PersistError> {
    let json = serde_json::to_string_pretty(&store.snapshot()?).map_err(|source| {
        PersistError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;
    std::fs::write(path, json).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Store snapshot saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtm_store::VariableStore;

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = MemoryStore::new();
        store.create_collection("Brand").await.unwrap();
        save_store(&store, &path).unwrap();

        let loaded = load_store(&path).unwrap();
        let collections = loaded.list_collections().await.unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].name, "Brand");
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = load_store(&dir.path().join("none.json")).unwrap();
        assert!(store.snapshot().unwrap().collections.is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(load_store(&path), Err(PersistError::Json { .. })));
    }
}
