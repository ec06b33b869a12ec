//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    config::{PlayerStoreKind, QuizConfig},
    image_origin::HttpImageFetcher,
    persistence::{InMemoryPlayerRepo, JsonFileDatasetCache, JsonFilePlayerRepo},
    ports::{
        ClockPort, DatasetCacheRepo, DatasetSourcePort, ImageFetchPort, PlayerStateRepo,
        RandomPort,
    },
    wikidata::WikidataClient,
};
use crate::use_cases::{DatasetCache, ImageResolver, PlayerStore, PuzzleEngine};

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub dataset: Arc<DatasetCache>,
    pub images: Arc<ImageResolver>,
    pub players: Arc<PlayerStore>,
    pub puzzle: Arc<PuzzleEngine>,
}

/// Port implementations the application is assembled from.
pub struct Ports {
    pub dataset_source: Arc<dyn DatasetSourcePort>,
    pub dataset_repo: Arc<dyn DatasetCacheRepo>,
    pub player_repo: Arc<dyn PlayerStateRepo>,
    pub image_fetcher: Arc<dyn ImageFetchPort>,
    pub clock: Arc<dyn ClockPort>,
    pub random: Arc<dyn RandomPort>,
}

impl Ports {
    /// Production adapters as selected by `config`.
    pub fn from_config(config: &QuizConfig) -> Self {
        let player_repo: Arc<dyn PlayerStateRepo> = match config.player_store {
            PlayerStoreKind::File => Arc::new(JsonFilePlayerRepo::new(config.players_dir())),
            PlayerStoreKind::Memory => Arc::new(InMemoryPlayerRepo::new()),
        };

        Self {
            dataset_source: Arc::new(WikidataClient::new(
                &config.sparql_endpoint,
                &config.user_agent,
                config.sparql_timeout,
            )),
            dataset_repo: Arc::new(JsonFileDatasetCache::new(config.dataset_cache_path())),
            player_repo,
            image_fetcher: Arc::new(HttpImageFetcher::new(
                &config.user_agent,
                config.image_timeout,
            )),
            clock: Arc::new(SystemClock::new()),
            random: Arc::new(SystemRandom::new()),
        }
    }
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(ports: Ports, freshness_window: chrono::Duration) -> Self {
        let dataset = Arc::new(DatasetCache::new(
            ports.dataset_source,
            ports.dataset_repo,
            ports.clock,
            ports.random.clone(),
            freshness_window,
        ));
        let images = Arc::new(ImageResolver::new(dataset.clone(), ports.image_fetcher));
        let players = Arc::new(PlayerStore::new(ports.player_repo));
        let puzzle = Arc::new(PuzzleEngine::new(
            dataset.clone(),
            players.clone(),
            ports.random,
        ));

        Self {
            use_cases: UseCases {
                dataset,
                images,
                players,
                puzzle,
            },
        }
    }

    pub fn from_config(config: &QuizConfig) -> Self {
        Self::new(Ports::from_config(config), config.dataset_ttl)
    }
}
