//! Player state persistence.
//!
//! Thin layer over `PlayerStateRepo`: every call goes to the backing store.
//! Unreadable records are treated as absent so a corrupt file can never lock
//! a player out.

use std::sync::Arc;

use wappenquiz_domain::{PlayerKey, PlayerState};

use crate::infrastructure::ports::{PlayerStateRepo, RepoError};

pub struct PlayerStore {
    repo: Arc<dyn PlayerStateRepo>,
}

impl PlayerStore {
    pub fn new(repo: Arc<dyn PlayerStateRepo>) -> Self {
        Self { repo }
    }

    /// Stored state for `key`, or a fresh zero state.
    pub async fn load(&self, key: &PlayerKey) -> PlayerState {
        match self.repo.get(key).await {
            Ok(Some(state)) => state,
            Ok(None) => PlayerState::new(),
            Err(e) => {
                tracing::warn!(player = %key, error = %e, "Player state unreadable, starting fresh");
                PlayerState::new()
            }
        }
    }

    /// Overwrite the whole record for `key`.
    pub async fn save(&self, key: &PlayerKey, state: &PlayerState) -> Result<(), RepoError> {
        self.repo.put(key, state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockPlayerStateRepo;
    use mockall::predicate::eq;

    fn key() -> PlayerKey {
        PlayerKey::new("p1").unwrap()
    }

    #[tokio::test]
    async fn absent_record_is_fresh_state() {
        let mut repo = MockPlayerStateRepo::new();
        repo.expect_get().with(eq(key())).returning(|_| Ok(None));

        let state = PlayerStore::new(Arc::new(repo)).load(&key()).await;
        assert_eq!(state, PlayerState::new());
    }

    #[tokio::test]
    async fn corrupt_record_is_fresh_state() {
        let mut repo = MockPlayerStateRepo::new();
        repo.expect_get()
            .returning(|_| Err(RepoError::serialization("trailing characters")));

        let state = PlayerStore::new(Arc::new(repo)).load(&key()).await;
        assert_eq!(state, PlayerState::new());
    }

    #[tokio::test]
    async fn every_load_reads_the_store() {
        let mut repo = MockPlayerStateRepo::new();
        repo.expect_get().times(2).returning(|_| Ok(None));

        let store = PlayerStore::new(Arc::new(repo));
        store.load(&key()).await;
        store.load(&key()).await;
    }

    #[tokio::test]
    async fn save_errors_propagate() {
        let mut repo = MockPlayerStateRepo::new();
        repo.expect_put()
            .returning(|_, _| Err(RepoError::storage("save_player", "read-only file system")));

        let result = PlayerStore::new(Arc::new(repo))
            .save(&key(), &PlayerState::new())
            .await;
        assert!(matches!(result, Err(RepoError::Storage { .. })));
    }
}
