//! Runtime configuration.
//!
//! Everything is read from environment variables (optionally seeded from
//! `.env.local` / `.env` at the repository root). Invalid values fall back to
//! the default with a warning instead of aborting startup.

use std::path::PathBuf;
use std::time::Duration;

/// Default Wikidata SPARQL endpoint.
pub const DEFAULT_SPARQL_ENDPOINT: &str = "https://query.wikidata.org/sparql";

/// Default listen port.
pub const DEFAULT_SERVER_PORT: u16 = 5000;

/// Which backend persists player records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStoreKind {
    /// One JSON file per player under `<data_dir>/players`
    File,
    /// Process-local map; state is lost on restart
    Memory,
}

#[derive(Debug, Clone)]
pub struct QuizConfig {
    pub server_host: String,
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub sparql_endpoint: String,
    pub user_agent: String,
    pub dataset_ttl: chrono::Duration,
    pub sparql_timeout: Duration,
    pub image_timeout: Duration,
    pub player_store: PlayerStoreKind,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: DEFAULT_SERVER_PORT,
            data_dir: PathBuf::from("data"),
            sparql_endpoint: DEFAULT_SPARQL_ENDPOINT.to_string(),
            user_agent: default_user_agent(),
            dataset_ttl: chrono::Duration::hours(
                wappenquiz_domain::DEFAULT_FRESHNESS_WINDOW_HOURS,
            ),
            sparql_timeout: Duration::from_secs(120),
            image_timeout: Duration::from_secs(10),
            player_store: PlayerStoreKind::File,
        }
    }
}

impl QuizConfig {
    /// Build the configuration from the process environment.
    ///
    /// Supported environment variables:
    /// - SERVER_HOST, SERVER_PORT (or PORT)
    /// - QUIZ_DATA_DIR: directory for the dataset cache and player records
    /// - QUIZ_SPARQL_ENDPOINT, QUIZ_USER_AGENT
    /// - QUIZ_DATASET_TTL_HOURS (range: 1-720)
    /// - QUIZ_SPARQL_TIMEOUT_SECS, QUIZ_IMAGE_TIMEOUT_SECS (range: 1-600)
    /// - QUIZ_PLAYER_STORE: `file` or `memory`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`QuizConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = non_empty(lookup("SERVER_HOST")) {
            config.server_host = host;
        }
        if let Some(port) = non_empty(lookup("SERVER_PORT")).or_else(|| non_empty(lookup("PORT")))
        {
            match port.parse::<u16>() {
                Ok(port) => config.server_port = port,
                Err(_) => tracing::warn!(value = %port, "SERVER_PORT is not a valid port, ignoring"),
            }
        }
        if let Some(dir) = non_empty(lookup("QUIZ_DATA_DIR")) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(endpoint) = non_empty(lookup("QUIZ_SPARQL_ENDPOINT")) {
            config.sparql_endpoint = endpoint;
        }
        if let Some(agent) = non_empty(lookup("QUIZ_USER_AGENT")) {
            config.user_agent = agent;
        }
        if let Some(hours) = parse_in_range(&lookup, "QUIZ_DATASET_TTL_HOURS", 1, 720) {
            config.dataset_ttl = chrono::Duration::hours(hours as i64);
        }
        if let Some(secs) = parse_in_range(&lookup, "QUIZ_SPARQL_TIMEOUT_SECS", 1, 600) {
            config.sparql_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_in_range(&lookup, "QUIZ_IMAGE_TIMEOUT_SECS", 1, 600) {
            config.image_timeout = Duration::from_secs(secs);
        }
        if let Some(kind) = non_empty(lookup("QUIZ_PLAYER_STORE")) {
            match kind.to_ascii_lowercase().as_str() {
                "file" => config.player_store = PlayerStoreKind::File,
                "memory" => config.player_store = PlayerStoreKind::Memory,
                _ => tracing::warn!(value = %kind, "QUIZ_PLAYER_STORE must be 'file' or 'memory', ignoring"),
            }
        }

        config
    }

    pub fn dataset_cache_path(&self) -> PathBuf {
        self.data_dir.join("municipalities_cache.json")
    }

    pub fn players_dir(&self) -> PathBuf {
        self.data_dir.join("players")
    }
}

fn default_user_agent() -> String {
    format!(
        "WappenQuiz/{} (coat of arms quiz; image proxy)",
        env!("CARGO_PKG_VERSION")
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_in_range(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    min: u64,
    max: u64,
) -> Option<u64> {
    let raw = non_empty(lookup(key))?;
    match raw.parse::<u64>() {
        Ok(value) if (min..=max).contains(&value) => {
            tracing::info!(key, value, "Applied environment override");
            Some(value)
        }
        Ok(value) => {
            tracing::warn!(key, value, min, max, "Value out of range, ignoring");
            None
        }
        Err(_) => {
            tracing::warn!(key, value = %raw, "Value is not a valid number, ignoring");
            None
        }
    }
}
