//! JSON file persistence.
//!
//! Every record is one pretty-printed JSON document. Writes go to a uniquely
//! named temp file in the target directory, are synced, and then renamed over
//! the target, so readers see either the old or the new document, never a
//! partial one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;
use wappenquiz_domain::{DatasetSnapshot, PlayerKey, PlayerState};

use crate::infrastructure::ports::{DatasetCacheRepo, PlayerStateRepo, RepoError};

/// Read and decode `path`; `Ok(None)` if it does not exist.
async fn read_json<T: DeserializeOwned>(
    path: &Path,
    operation: &'static str,
) -> Result<Option<T>, RepoError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(RepoError::storage(operation, e)),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| RepoError::serialization(format!("{}: {}", path.display(), e)))
}

/// Encode `value` and atomically replace `path` with it.
async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    operation: &'static str,
) -> Result<(), RepoError> {
    let json = serde_json::to_vec_pretty(value).map_err(RepoError::serialization)?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .await
        .map_err(|e| RepoError::storage(operation, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "record".to_string());
    let tmp_path = dir.join(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

    if let Err(e) = write_and_sync(&tmp_path, &json).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(RepoError::storage(operation, e));
    }

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(RepoError::storage(operation, e));
    }

    Ok(())
}

async fn write_and_sync(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

// =============================================================================
// Dataset cache
// =============================================================================

/// Dataset snapshot persisted as a single JSON file.
pub struct JsonFileDatasetCache {
    path: PathBuf,
}

impl JsonFileDatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetCacheRepo for JsonFileDatasetCache {
    async fn load(&self) -> Result<Option<DatasetSnapshot>, RepoError> {
        read_json(&self.path, "load_dataset_cache").await
    }

    async fn save(&self, snapshot: &DatasetSnapshot) -> Result<(), RepoError> {
        write_json_atomic(&self.path, snapshot, "save_dataset_cache").await
    }
}

// =============================================================================
// Player records
// =============================================================================

/// One JSON file per player, named after the player key.
pub struct JsonFilePlayerRepo {
    dir: PathBuf,
}

impl JsonFilePlayerRepo {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, key: &PlayerKey) -> PathBuf {
        // PlayerKey is restricted to [A-Za-z0-9_-], so it is a safe file name.
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl PlayerStateRepo for JsonFilePlayerRepo {
    async fn get(&self, key: &PlayerKey) -> Result<Option<PlayerState>, RepoError> {
        read_json(&self.record_path(key), "load_player").await
    }

    async fn put(&self, key: &PlayerKey, state: &PlayerState) -> Result<(), RepoError> {
        write_json_atomic(&self.record_path(key), state, "save_player").await
    }
}
