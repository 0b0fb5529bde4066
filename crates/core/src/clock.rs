// SPDX-License-Identifier: MIT

//! Clock abstraction for testable time handling.
//!
//! `TaskOutcome::begin_time`/`end_time` are a "monotonic-wall pair": they
//! must compare in issue order (`begin_time <= end_time`) and serialize as
//! wall-clock timestamps in the run record. `chrono::DateTime<Utc>` gives
//! us both for free, so unlike the daemon workspace's `Clock` (which
//! returns a bare `std::time::Instant` for monotonic-only comparisons)
//! ours returns the wall-clock value directly.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// A clock that provides the current time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fake clock for deterministic tests.
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self { current: Arc::new(Mutex::new(Utc::now())) }
    }

    pub fn at(time: DateTime<Utc>) -> Self {
        Self { current: Arc::new(Mutex::new(time)) }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        let delta = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        *self.current.lock() += delta;
    }

    pub fn set(&self, time: DateTime<Utc>) {
        *self.current.lock() = time;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_advances_monotonically() {
        let clock = FakeClock::new();
        let t0 = clock.now();
        clock.advance(Duration::from_secs(5));
        let t1 = clock.now();
        assert!(t1 > t0);
        assert_eq!((t1 - t0).num_seconds(), 5);
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let t0 = clock.now();
        let t1 = clock.now();
        assert!(t1 >= t0);
    }
}
