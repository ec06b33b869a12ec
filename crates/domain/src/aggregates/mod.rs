//! Aggregates with invariants that span more than one value.

pub mod dataset;
pub mod player_state;

pub use dataset::{DatasetSnapshot, ImageRegistry, DEFAULT_FRESHNESS_WINDOW_HOURS};
pub use player_state::{AnswerOutcome, HistoryEntry, PlayerState, Puzzle, Stats, MAX_OPTIONS};
