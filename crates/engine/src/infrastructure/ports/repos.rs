//! Repository port traits for durable state.

use async_trait::async_trait;
use wappenquiz_domain::{DatasetSnapshot, PlayerKey, PlayerState};

use super::error::RepoError;

// =============================================================================
// Dataset Cache Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatasetCacheRepo: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet; `Err(Serialization)`
    /// when the persisted copy is unreadable.
    async fn load(&self) -> Result<Option<DatasetSnapshot>, RepoError>;

    /// Replace the persisted copy. Implementations must never leave a
    /// half-written record behind.
    async fn save(&self, snapshot: &DatasetSnapshot) -> Result<(), RepoError>;
}

// =============================================================================
// Player Storage
// =============================================================================

/// Keyed whole-record store for player state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerStateRepo: Send + Sync {
    async fn get(&self, key: &PlayerKey) -> Result<Option<PlayerState>, RepoError>;
    async fn put(&self, key: &PlayerKey, state: &PlayerState) -> Result<(), RepoError>;
}
