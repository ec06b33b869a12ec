//! In-memory stores.
//!
//! Nothing survives a restart. Used by tests and by `QUIZ_PLAYER_STORE=memory`.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;
use wappenquiz_domain::{DatasetSnapshot, PlayerKey, PlayerState};

use crate::infrastructure::ports::{DatasetCacheRepo, PlayerStateRepo, RepoError};

/// Player records in a concurrent map.
#[derive(Default)]
pub struct InMemoryPlayerRepo {
    records: DashMap<PlayerKey, PlayerState>,
}

impl InMemoryPlayerRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl PlayerStateRepo for InMemoryPlayerRepo {
    async fn get(&self, key: &PlayerKey) -> Result<Option<PlayerState>, RepoError> {
        Ok(self.records.get(key).map(|r| r.value().clone()))
    }

    async fn put(&self, key: &PlayerKey, state: &PlayerState) -> Result<(), RepoError> {
        self.records.insert(key.clone(), state.clone());
        Ok(())
    }
}

/// Single-slot dataset cache.
#[derive(Default)]
pub struct InMemoryDatasetCache {
    slot: RwLock<Option<DatasetSnapshot>>,
}

impl InMemoryDatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: DatasetSnapshot) -> Self {
        Self {
            slot: RwLock::new(Some(snapshot)),
        }
    }
}

#[async_trait]
impl DatasetCacheRepo for InMemoryDatasetCache {
    async fn load(&self) -> Result<Option<DatasetSnapshot>, RepoError> {
        Ok(self.slot.read().await.clone())
    }

    async fn save(&self, snapshot: &DatasetSnapshot) -> Result<(), RepoError> {
        *self.slot.write().await = Some(snapshot.clone());
        Ok(())
    }
}
