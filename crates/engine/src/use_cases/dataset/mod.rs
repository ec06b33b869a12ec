//! Dataset use cases.
//!
//! `DatasetCache` owns the process-wide reference dataset. Lookup order:
//! in-memory snapshot, persisted snapshot, cold fetch from the remote source.
//! A snapshot is reused while younger than the freshness window.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use regex_lite::Regex;
use tokio::sync::{Mutex, RwLock};
use wappenquiz_domain::{DatasetSnapshot, ImageRegistry, Municipality};

use crate::infrastructure::ports::{
    ClockPort, DatasetCacheRepo, DatasetFetchError, DatasetSourcePort, RandomPort, SourceRecord,
};
use crate::use_cases::images::register_image;

/// Names that are not real places: bare Wikidata ids (unlabeled items),
/// list articles and namespaced meta pages.
const EXCLUDED_NAME_PATTERN: &str =
    r"^(?:Q\d+|Liste (?:der|von) .*|(?:Kategorie|Vorlage|Wikipedia|Datei):.*)$";

fn excluded_name_regex() -> Option<&'static Regex> {
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    REGEX
        .get_or_init(|| match Regex::new(EXCLUDED_NAME_PATTERN) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::error!(error = %e, "Invalid name exclusion pattern, filter disabled");
                None
            }
        })
        .as_ref()
}

/// True if `name` should not become a quiz entity.
pub fn is_excluded_name(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty() || excluded_name_regex().is_some_and(|re| re.is_match(trimmed))
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Dataset fetch failed: {0}")]
    Fetch(#[from] DatasetFetchError),
}

/// Time-bounded cache of the reference dataset.
pub struct DatasetCache {
    source: Arc<dyn DatasetSourcePort>,
    repo: Arc<dyn DatasetCacheRepo>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    freshness_window: chrono::Duration,
    current: RwLock<Option<Arc<DatasetSnapshot>>>,
    refresh: Mutex<RefreshState>,
    /// Bumped each time a refresh attempt finishes, successful or not.
    refresh_attempts: AtomicU64,
}

/// Outcome of the most recent refresh attempt, handed to callers that
/// queued behind it.
#[derive(Default)]
struct RefreshState {
    last_failure: Option<DatasetFetchError>,
}

impl DatasetCache {
    pub fn new(
        source: Arc<dyn DatasetSourcePort>,
        repo: Arc<dyn DatasetCacheRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        freshness_window: chrono::Duration,
    ) -> Self {
        Self {
            source,
            repo,
            clock,
            random,
            freshness_window,
            current: RwLock::new(None),
            refresh: Mutex::new(RefreshState::default()),
            refresh_attempts: AtomicU64::new(0),
        }
    }

    /// The installed snapshot, without triggering a refresh.
    pub async fn current(&self) -> Option<Arc<DatasetSnapshot>> {
        self.current.read().await.clone()
    }

    /// A snapshot younger than the freshness window, refreshing if needed.
    ///
    /// Only one caller refreshes at a time. Callers that queued behind it
    /// share its outcome: the snapshot it installed, or the error it hit.
    /// The next caller to arrive after a failed attempt tries again.
    pub async fn get_dataset(&self) -> Result<Arc<DatasetSnapshot>, DatasetError> {
        let attempts_seen = self.refresh_attempts.load(Ordering::Acquire);
        if let Some(snapshot) = self.fresh_in_memory().await {
            return Ok(snapshot);
        }

        let mut state = self.refresh.lock().await;

        if let Some(snapshot) = self.fresh_in_memory().await {
            return Ok(snapshot);
        }
        if self.refresh_attempts.load(Ordering::Acquire) != attempts_seen {
            if let Some(e) = &state.last_failure {
                tracing::debug!(error = %e, "Sharing failed dataset refresh with queued caller");
                return Err(e.clone().into());
            }
        }

        let outcome = self.refresh_locked().await;
        state.last_failure = outcome.as_ref().err().cloned();
        self.refresh_attempts.fetch_add(1, Ordering::Release);
        outcome.map_err(DatasetError::from)
    }

    /// Persisted snapshot if usable, otherwise a cold fetch. Caller holds
    /// the refresh lock.
    async fn refresh_locked(&self) -> Result<Arc<DatasetSnapshot>, DatasetFetchError> {
        if let Some(snapshot) = self.load_persisted().await {
            return Ok(self.install(snapshot).await);
        }

        let snapshot = self.cold_fetch().await?;
        let snapshot = self.install(snapshot).await;

        if let Err(e) = self.repo.save(&snapshot).await {
            tracing::warn!(error = %e, "Failed to persist dataset snapshot, serving from memory");
        }

        Ok(snapshot)
    }

    async fn fresh_in_memory(&self) -> Option<Arc<DatasetSnapshot>> {
        let now = self.clock.now();
        self.current
            .read()
            .await
            .as_ref()
            .filter(|s| s.is_fresh(now, self.freshness_window))
            .cloned()
    }

    /// A usable persisted snapshot, or `None` if it is missing, unreadable,
    /// inconsistent or stale.
    async fn load_persisted(&self) -> Option<DatasetSnapshot> {
        let snapshot = match self.repo.load().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::info!("No persisted dataset snapshot");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Persisted dataset snapshot unreadable, refetching");
                return None;
            }
        };

        if !snapshot.is_consistent() {
            tracing::warn!(
                entities = snapshot.len(),
                "Persisted dataset snapshot is inconsistent, refetching"
            );
            return None;
        }

        let now = self.clock.now();
        if !snapshot.is_fresh(now, self.freshness_window) {
            tracing::info!(
                age_hours = snapshot.age(now).num_hours(),
                "Persisted dataset snapshot is stale, refetching"
            );
            return None;
        }

        tracing::info!(
            entities = snapshot.len(),
            fetched_at = %snapshot.fetched_at(),
            "Loaded dataset snapshot from cache"
        );
        Some(snapshot)
    }

    async fn cold_fetch(&self) -> Result<DatasetSnapshot, DatasetFetchError> {
        let records = self.source.fetch_dataset().await.map_err(|e| {
            tracing::error!(error = %e, "Dataset fetch failed");
            e
        })?;

        let snapshot = build_snapshot(records, self.random.as_ref(), self.clock.now());
        tracing::info!(
            entities = snapshot.len(),
            image_mappings = snapshot.image_mappings().len(),
            "Fetched dataset from source"
        );
        Ok(snapshot)
    }

    async fn install(&self, snapshot: DatasetSnapshot) -> Arc<DatasetSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write().await = Some(snapshot.clone());
        snapshot
    }
}

/// Filter source records and mint a fresh image id for each kept entity.
fn build_snapshot(
    records: Vec<SourceRecord>,
    random: &dyn RandomPort,
    fetched_at: chrono::DateTime<chrono::Utc>,
) -> DatasetSnapshot {
    let mut registry = ImageRegistry::new();
    let mut seen = std::collections::HashSet::new();
    let mut entities = Vec::with_capacity(records.len());
    let mut excluded = 0usize;
    let mut duplicates = 0usize;

    for record in records {
        if is_excluded_name(&record.name) {
            excluded += 1;
            continue;
        }
        if !seen.insert(record.name.clone()) {
            duplicates += 1;
            continue;
        }

        let image_id = register_image(random, &mut registry, record.image_url);
        entities.push(
            Municipality::new(record.name, image_id.proxy_path())
                .with_description(record.description)
                .with_source_article_url(record.article_url),
        );
    }

    if excluded > 0 || duplicates > 0 {
        tracing::debug!(excluded, duplicates, "Dropped source records");
    }

    DatasetSnapshot::new(entities, registry, fetched_at)
}
