//! Wappen Quiz domain types.
//!
//! Pure data and invariants for the coat-of-arms quiz:
//!
//! - `entities/` - immutable quiz subjects (municipalities)
//! - `aggregates/` - dataset snapshots and the per-player puzzle state machine
//! - `ids` - opaque image and player identifiers
//!
//! Nothing in this crate performs I/O or draws random numbers; the engine injects both.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod ids;

pub use aggregates::{
    AnswerOutcome, DatasetSnapshot, HistoryEntry, ImageRegistry, PlayerState, Puzzle, Stats,
    DEFAULT_FRESHNESS_WINDOW_HOURS, MAX_OPTIONS,
};
pub use entities::Municipality;
pub use error::DomainError;
pub use ids::{ImageId, PlayerKey, IMAGE_ROUTE_PREFIX};
