//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - The remote dataset source (could swap Wikidata -> a static dump)
//! - Origin image retrieval
//! - Persistence of the dataset cache and player records (file, memory)
//! - Clock/Random (for testing)

mod error;
mod external;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{DatasetCacheRepo, PlayerStateRepo};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{DatasetSourcePort, FetchedImage, ImageFetchPort, SourceRecord};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockDatasetCacheRepo, MockPlayerStateRepo};

#[cfg(test)]
pub use external::{MockDatasetSourcePort, MockImageFetchPort};

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{DatasetFetchError, ImageFetchError, RepoError};
