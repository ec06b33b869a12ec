//! Storage adapters for the dataset cache and player records.
//!
//! - `json_file` - whole-document JSON files replaced atomically
//! - `memory` - process-local maps for tests and ephemeral deployments

mod json_file;
mod memory;

pub use json_file::{JsonFileDatasetCache, JsonFilePlayerRepo};
pub use memory::{InMemoryDatasetCache, InMemoryPlayerRepo};
