//! Use cases - quiz operations orchestrated over the ports.
//!
//! - `dataset` - time-bounded cache of the reference dataset
//! - `images` - opaque image ids and the origin proxy
//! - `player` - durable per-player state
//! - `puzzle` - the puzzle state machine

pub mod dataset;
pub mod images;
pub mod player;
pub mod puzzle;

pub use dataset::{DatasetCache, DatasetError};
pub use images::{ImageError, ImageResolver};
pub use player::PlayerStore;
pub use puzzle::{IssuedPuzzle, PuzzleEngine, PuzzleError, SubmitResult};
