//! Monotonic tick sources.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use turbine_types::Tick;

/// A monotonic source of [`Tick`]s shared by every task.
pub trait Clock: Send + Sync {
    /// Current time. Never smaller than a previously returned value.
    fn now(&self) -> Tick;
}

/// Host monotonic clock with its epoch at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Create a clock whose epoch is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// The instant ticks are measured from.
    #[must_use]
    pub fn epoch(&self) -> Instant {
        self.epoch
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Tick {
        let us = u64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(u64::MAX);
        Tick::from_micros(us)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_us: AtomicU64,
}

impl ManualClock {
    /// Create a clock stopped at `start`.
    #[must_use]
    pub fn starting_at(start: Tick) -> Self {
        Self {
            now_us: AtomicU64::new(start.as_micros()),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let us = u64::try_from(by.as_micros()).unwrap_or(u64::MAX);
        let _previous = self
            .now_us
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |now| {
                Some(now.saturating_add(us))
            });
    }

    /// Jump to `to`. Requests to move backwards are ignored.
    pub fn set(&self, to: Tick) {
        self.now_us.fetch_max(to.as_micros(), Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Tick {
        Tick::from_micros(self.now_us.load(Ordering::Acquire))
    }
}
