//! Puzzle use cases.
//!
//! `PuzzleEngine` drives the per-player state machine: issue a puzzle (or
//! re-serve the pending one), score answers, reset. Every operation runs
//! load -> mutate -> save under a per-player async lock, so concurrent
//! requests for the same player cannot lose each other's updates.

mod selection;

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use wappenquiz_domain::{
    AnswerOutcome, DomainError, HistoryEntry, PlayerKey, PlayerState, Puzzle, Stats,
};

use crate::infrastructure::ports::{RandomPort, RepoError};
use crate::use_cases::dataset::{DatasetCache, DatasetError};
use crate::use_cases::player::PlayerStore;

/// The puzzle a player should answer, with their progress so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedPuzzle {
    pub puzzle: Puzzle,
    pub stats: Stats,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    pub outcome: AnswerOutcome,
    pub stats: Stats,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    #[error("No puzzle in progress")]
    NoPuzzlePending,
    #[error("Dataset is empty")]
    EmptyDataset,
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("Failed to save player state: {0}")]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Domain(DomainError),
}

impl From<DomainError> for PuzzleError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NoPuzzlePending => Self::NoPuzzlePending,
            other => Self::Domain(other),
        }
    }
}

/// A handle on one player's lock in the shared map.
///
/// Dropping the last handle removes the map entry, so the map only holds
/// players with requests in flight. Also runs when a request is cancelled.
struct PlayerLockEntry<'a> {
    locks: &'a DashMap<PlayerKey, Arc<Mutex<()>>>,
    key: &'a PlayerKey,
    lock: Arc<Mutex<()>>,
}

impl<'a> PlayerLockEntry<'a> {
    fn acquire(locks: &'a DashMap<PlayerKey, Arc<Mutex<()>>>, key: &'a PlayerKey) -> Self {
        let lock = locks.entry(key.clone()).or_default().clone();
        Self { locks, key, lock }
    }
}

impl Drop for PlayerLockEntry<'_> {
    fn drop(&mut self) {
        // One reference in the map plus ours: nobody else is waiting.
        self.locks
            .remove_if(self.key, |_, lock| Arc::strong_count(lock) == 2);
    }
}

pub struct PuzzleEngine {
    dataset: Arc<DatasetCache>,
    players: Arc<PlayerStore>,
    random: Arc<dyn RandomPort>,
    player_locks: DashMap<PlayerKey, Arc<Mutex<()>>>,
}

impl PuzzleEngine {
    pub fn new(
        dataset: Arc<DatasetCache>,
        players: Arc<PlayerStore>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            dataset,
            players,
            random,
            player_locks: DashMap::new(),
        }
    }

    /// Run `op` while holding the player's lock.
    async fn with_player_lock<T>(&self, key: &PlayerKey, op: impl Future<Output = T>) -> T {
        let entry = PlayerLockEntry::acquire(&self.player_locks, key);
        let _guard = entry.lock.lock().await;
        op.await
    }

    /// Re-serve the pending puzzle, or issue a new one.
    pub async fn get_puzzle(&self, key: &PlayerKey) -> Result<IssuedPuzzle, PuzzleError> {
        self.with_player_lock(key, self.issue_or_reserve(key)).await
    }

    async fn issue_or_reserve(&self, key: &PlayerKey) -> Result<IssuedPuzzle, PuzzleError> {
        let mut state = self.players.load(key).await;
        if let Some(pending) = state.pending_puzzle() {
            return Ok(IssuedPuzzle {
                puzzle: pending.clone(),
                stats: state.stats(),
                history: state.history().to_vec(),
            });
        }

        let dataset = self.dataset.get_dataset().await?;
        let pool = dataset.entities();
        let candidates = state.candidates(pool);
        let correct = selection::choose_answer(&candidates, self.random.as_ref())
            .ok_or(PuzzleError::EmptyDataset)?;
        let options = selection::build_options(correct, pool, self.random.as_ref());

        let puzzle = state.issue(Puzzle::new(correct, options)?)?.clone();
        self.players.save(key, &state).await?;

        tracing::debug!(
            player = %key,
            answer = %puzzle.correct_name(),
            options = puzzle.options().len(),
            used = state.used_names().len(),
            "Issued puzzle"
        );

        Ok(IssuedPuzzle {
            puzzle,
            stats: state.stats(),
            history: state.history().to_vec(),
        })
    }

    /// Score `answer` against the pending puzzle.
    ///
    /// Without a pending puzzle nothing is changed or saved.
    pub async fn submit(&self, key: &PlayerKey, answer: &str) -> Result<SubmitResult, PuzzleError> {
        self.with_player_lock(key, self.score(key, answer)).await
    }

    async fn score(&self, key: &PlayerKey, answer: &str) -> Result<SubmitResult, PuzzleError> {
        let mut state = self.players.load(key).await;
        let outcome = state.answer(answer)?;
        self.players.save(key, &state).await?;

        tracing::debug!(
            player = %key,
            is_correct = outcome.is_correct,
            correct = state.stats().correct,
            wrong = state.stats().wrong,
            "Scored answer"
        );

        Ok(SubmitResult {
            outcome,
            stats: state.stats(),
            history: state.history().to_vec(),
        })
    }

    /// Forget everything about the player.
    pub async fn reset(&self, key: &PlayerKey) -> Result<(), PuzzleError> {
        self.with_player_lock(key, self.clear(key)).await
    }

    async fn clear(&self, key: &PlayerKey) -> Result<(), PuzzleError> {
        let mut state = self.players.load(key).await;
        state.reset();
        self.players.save(key, &state).await?;

        tracing::info!(player = %key, "Player state reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, ScriptedRandom, SystemRandom};
    use crate::infrastructure::persistence::{InMemoryDatasetCache, InMemoryPlayerRepo};
    use crate::infrastructure::ports::{
        DatasetFetchError, MockDatasetSourcePort, MockPlayerStateRepo, PlayerStateRepo,
        SourceRecord,
    };
    use chrono::Utc;
    use std::collections::HashSet;
    use wappenquiz_domain::MAX_OPTIONS;

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Ort {i:02}")).collect()
    }

    fn dataset_of(names: Vec<String>) -> Arc<DatasetCache> {
        let mut source = MockDatasetSourcePort::new();
        source.expect_fetch_dataset().returning(move || {
            Ok(names
                .iter()
                .map(|n| SourceRecord::new(n.clone(), format!("https://commons.example/{n}.svg")))
                .collect())
        });
        Arc::new(DatasetCache::new(
            Arc::new(source),
            Arc::new(InMemoryDatasetCache::new()),
            Arc::new(FixedClock(Utc::now())),
            Arc::new(ScriptedRandom::zeros()),
            chrono::Duration::hours(24),
        ))
    }

    fn engine_with(
        dataset: Arc<DatasetCache>,
        repo: Arc<dyn PlayerStateRepo>,
        random: Arc<dyn RandomPort>,
    ) -> PuzzleEngine {
        PuzzleEngine::new(dataset, Arc::new(PlayerStore::new(repo)), random)
    }

    fn engine(names: &[&str], random: Arc<dyn RandomPort>) -> PuzzleEngine {
        engine_with(
            dataset_of(names.iter().map(|n| n.to_string()).collect()),
            Arc::new(InMemoryPlayerRepo::new()),
            random,
        )
    }

    fn key(raw: &str) -> PlayerKey {
        PlayerKey::new(raw).unwrap()
    }

    #[tokio::test]
    async fn abc_scenario() {
        let engine = engine(&["A", "B", "C"], Arc::new(ScriptedRandom::zeros()));
        let player = key("p1");

        let issued = engine.get_puzzle(&player).await.unwrap();
        assert_eq!(issued.puzzle.correct_name(), "A");
        assert_eq!(issued.puzzle.options(), ["B", "C", "A"]);

        let wrong = engine.submit(&player, "B").await.unwrap();
        assert!(!wrong.outcome.is_correct);
        assert_eq!(wrong.outcome.correct_name, "A");
        assert_eq!(wrong.stats, Stats { correct: 0, wrong: 1 });
        assert_eq!(engine.get_puzzle(&player).await.unwrap().puzzle, issued.puzzle);

        let right = engine.submit(&player, "A").await.unwrap();
        assert!(right.outcome.is_correct);
        assert_eq!(right.stats, Stats { correct: 1, wrong: 1 });
        assert_eq!(right.history.len(), 1);
        assert_eq!(right.history[0].correct_name, "A");
        assert_eq!(right.history[0].submitted_name, "B");
        assert!(!right.history[0].was_correct);

        let next = engine.get_puzzle(&player).await.unwrap();
        assert_ne!(next.puzzle.correct_name(), "A");
    }

    #[tokio::test]
    async fn repeated_get_reserves_identical_puzzle() {
        let engine = engine(&["A", "B", "C", "D"], Arc::new(SystemRandom::new()));
        let player = key("p1");

        let first = engine.get_puzzle(&player).await.unwrap();
        for _ in 0..5 {
            assert_eq!(engine.get_puzzle(&player).await.unwrap(), first);
        }
    }

    #[tokio::test]
    async fn options_length_follows_dataset_size() {
        for n in [1, 2, 9, 10, 11, 25] {
            let engine = engine_with(
                dataset_of(numbered(n)),
                Arc::new(InMemoryPlayerRepo::new()),
                Arc::new(SystemRandom::new()),
            );
            let issued = engine.get_puzzle(&key("p1")).await.unwrap();
            let options = issued.puzzle.options();

            assert_eq!(options.len(), n.min(MAX_OPTIONS), "dataset of {n}");
            let correct = issued.puzzle.correct_name();
            assert_eq!(options.iter().filter(|o| *o == correct).count(), 1);
        }
    }

    #[tokio::test]
    async fn no_repeat_until_exhaustion_then_cycle_restarts() {
        let names = numbered(12);
        let engine = engine_with(
            dataset_of(names.clone()),
            Arc::new(InMemoryPlayerRepo::new()),
            Arc::new(SystemRandom::new()),
        );
        let player = key("p1");

        let mut asked = HashSet::new();
        for _ in 0..names.len() {
            let issued = engine.get_puzzle(&player).await.unwrap();
            let answer = issued.puzzle.correct_name().to_string();
            assert!(asked.insert(answer.clone()), "{answer} asked twice in one cycle");
            engine.submit(&player, &answer).await.unwrap();
        }
        assert_eq!(asked.len(), names.len());

        // Next cycle: the used set was reset, so any name is eligible again.
        let issued = engine.get_puzzle(&player).await.unwrap();
        assert!(asked.contains(issued.puzzle.correct_name()));
    }

    #[tokio::test]
    async fn history_has_one_entry_per_answer_across_cycles() {
        let engine = engine(&["A", "B"], Arc::new(SystemRandom::new()));
        let player = key("p1");

        for _ in 0..6 {
            let issued = engine.get_puzzle(&player).await.unwrap();
            let answer = issued.puzzle.correct_name().to_string();
            engine.submit(&player, "nope").await.unwrap();
            engine.submit(&player, &answer).await.unwrap();
        }

        let result = engine.get_puzzle(&player).await.unwrap();
        let names: HashSet<&str> = result.history.iter().map(|h| h.correct_name.as_str()).collect();
        assert_eq!(result.history.len(), names.len());
        assert_eq!(result.history.len(), 2);
        assert_eq!(result.stats, Stats { correct: 6, wrong: 6 });
    }

    #[tokio::test]
    async fn submit_without_pending_is_rejected_and_saves_nothing() {
        let mut repo = MockPlayerStateRepo::new();
        repo.expect_get().returning(|_| Ok(None));
        repo.expect_put().never();

        let engine = engine_with(
            dataset_of(numbered(3)),
            Arc::new(repo),
            Arc::new(ScriptedRandom::zeros()),
        );

        let err = engine.submit(&key("p1"), "Ort 00").await.unwrap_err();
        assert!(matches!(err, PuzzleError::NoPuzzlePending));
    }

    #[tokio::test]
    async fn empty_or_unknown_answer_is_simply_wrong() {
        let engine = engine(&["A", "B", "C"], Arc::new(ScriptedRandom::zeros()));
        let player = key("p1");
        engine.get_puzzle(&player).await.unwrap();

        assert!(!engine.submit(&player, "").await.unwrap().outcome.is_correct);
        assert!(!engine.submit(&player, "a").await.unwrap().outcome.is_correct);
        let result = engine.submit(&player, "Atlantis").await.unwrap();
        assert_eq!(result.stats.wrong, 3);
        assert_eq!(result.history.len(), 1);
    }

    #[tokio::test]
    async fn reset_clears_state_and_next_get_issues_new_puzzle() {
        let repo = Arc::new(InMemoryPlayerRepo::new());
        // Zeros pick "A" first; the scripted 1 picks "B" after the reset.
        let random = Arc::new(ScriptedRandom::new([0, 0, 0, 0, 0, 1]));
        let engine = engine_with(
            dataset_of(vec!["A".into(), "B".into(), "C".into()]),
            repo.clone(),
            random,
        );
        let player = key("p1");

        let before = engine.get_puzzle(&player).await.unwrap();
        assert_eq!(before.puzzle.correct_name(), "A");
        engine.submit(&player, "C").await.unwrap();

        engine.reset(&player).await.unwrap();
        let stored = repo.get(&player).await.unwrap().unwrap();
        assert_eq!(stored, PlayerState::new());

        let after = engine.get_puzzle(&player).await.unwrap();
        assert_eq!(after.puzzle.correct_name(), "B");
        assert_eq!(after.stats, Stats::default());
        assert!(after.history.is_empty());
    }

    #[tokio::test]
    async fn empty_dataset_is_an_error() {
        let engine = engine(&[], Arc::new(ScriptedRandom::zeros()));
        let err = engine.get_puzzle(&key("p1")).await.unwrap_err();
        assert!(matches!(err, PuzzleError::EmptyDataset));
    }

    #[tokio::test]
    async fn dataset_failure_propagates() {
        let mut source = MockDatasetSourcePort::new();
        source
            .expect_fetch_dataset()
            .returning(|| Err(DatasetFetchError::Status { status: 503, body: "busy".into() }));
        let dataset = Arc::new(DatasetCache::new(
            Arc::new(source),
            Arc::new(InMemoryDatasetCache::new()),
            Arc::new(FixedClock(Utc::now())),
            Arc::new(ScriptedRandom::zeros()),
            chrono::Duration::hours(24),
        ));
        let engine = engine_with(
            dataset,
            Arc::new(InMemoryPlayerRepo::new()),
            Arc::new(ScriptedRandom::zeros()),
        );

        let err = engine.get_puzzle(&key("p1")).await.unwrap_err();
        assert!(matches!(err, PuzzleError::Dataset(DatasetError::Fetch(_))));
    }

    #[tokio::test]
    async fn players_do_not_share_state() {
        let engine = engine(&["A", "B", "C"], Arc::new(ScriptedRandom::zeros()));

        engine.get_puzzle(&key("alice")).await.unwrap();
        engine.submit(&key("alice"), "A").await.unwrap();

        let bob = engine.get_puzzle(&key("bob")).await.unwrap();
        assert_eq!(bob.stats, Stats::default());
        assert_eq!(bob.puzzle.correct_name(), "A");
    }

    #[tokio::test]
    async fn concurrent_submits_for_one_player_are_all_counted() {
        let engine = Arc::new(engine(&["A", "B", "C"], Arc::new(ScriptedRandom::zeros())));
        let player = key("p1");
        engine.get_puzzle(&player).await.unwrap();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let engine = engine.clone();
                let player = player.clone();
                tokio::spawn(async move { engine.submit(&player, "wrong").await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let issued = engine.get_puzzle(&player).await.unwrap();
        assert_eq!(issued.stats.wrong, 20);
        assert!(engine.player_locks.is_empty());
    }

    #[tokio::test]
    async fn finished_requests_release_their_player_locks() {
        let engine = engine(&["A", "B", "C"], Arc::new(ScriptedRandom::zeros()));

        for i in 0..100 {
            let player = key(&format!("visitor-{i}"));
            engine.reset(&player).await.unwrap();
            engine.get_puzzle(&player).await.unwrap();
        }
        engine.submit(&key("visitor-0"), "A").await.unwrap();
        assert!(engine.submit(&key("nobody"), "A").await.is_err());

        assert!(engine.player_locks.is_empty());
    }

    #[tokio::test]
    async fn cancelled_request_releases_its_player_lock() {
        let engine = engine(&["A", "B", "C"], Arc::new(ScriptedRandom::zeros()));
        let player = key("p1");

        let entry = PlayerLockEntry::acquire(&engine.player_locks, &player);
        let held = entry.lock.clone().lock_owned().await;
        let waiting = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            engine.reset(&player),
        )
        .await;
        assert!(waiting.is_err());
        assert_eq!(engine.player_locks.len(), 1);

        drop(held);
        drop(entry);
        assert!(engine.player_locks.is_empty());
    }
}
