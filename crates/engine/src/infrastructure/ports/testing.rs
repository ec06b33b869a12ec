//! Testability ports for injecting time and randomness.

use chrono::{DateTime, Utc};
use uuid::Uuid;

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait RandomPort: Send + Sync {
    /// Uniformly distributed index in `0..upper`. Callers never pass zero.
    fn gen_index(&self, upper: usize) -> usize;
    fn gen_uuid(&self) -> Uuid;
}
