//! Clock and random implementations.

use crate::infrastructure::ports::{ClockPort, RandomPort};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses real randomness.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_index(&self, upper: usize) -> usize {
        use rand::Rng;
        rand::thread_rng().gen_range(0..upper.max(1))
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Fixed clock for testing.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Scripted random for testing.
///
/// Hands out the queued values in order (reduced modulo the requested bound),
/// then zeros once the script runs dry. UUIDs count up from 1.
#[cfg(test)]
pub struct ScriptedRandom {
    script: std::sync::Mutex<std::collections::VecDeque<usize>>,
    next_uuid: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(script: impl IntoIterator<Item = usize>) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into_iter().collect()),
            next_uuid: std::sync::atomic::AtomicU64::new(1),
        }
    }

    pub fn zeros() -> Self {
        Self::new([])
    }
}

#[cfg(test)]
impl RandomPort for ScriptedRandom {
    fn gen_index(&self, upper: usize) -> usize {
        let next = self
            .script
            .lock()
            .map(|mut s| s.pop_front())
            .unwrap_or_default()
            .unwrap_or(0);
        next % upper.max(1)
    }

    fn gen_uuid(&self) -> Uuid {
        let n = self
            .next_uuid
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Uuid::from_u128(u128::from(n))
    }
}
