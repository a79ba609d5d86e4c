//! Monotonic time stamps.

use core::fmt;
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// A point on the monitor's monotonic clock, in microseconds since the clock epoch.
///
/// Ticks never go backwards on a given clock. Elapsed-time helpers saturate at
/// zero so that a stamp taken "in the future" relative to `now` (a sample
/// captured between two reads of the clock) yields zero latency instead of
/// wrapping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Tick(u64);

impl Tick {
    /// The clock epoch.
    pub const ZERO: Self = Self(0);

    /// Create a tick from microseconds since the epoch.
    #[must_use]
    pub const fn from_micros(us: u64) -> Self {
        Self(us)
    }

    /// Create a tick from milliseconds since the epoch.
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms.saturating_mul(1_000))
    }

    /// Microseconds since the epoch.
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Whole milliseconds since the epoch.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0 / 1_000
    }

    /// Time elapsed from `earlier` to `self`, saturating at zero.
    #[must_use]
    pub const fn saturating_since(self, earlier: Tick) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }

    /// Advance this tick by `duration`, saturating at `u64::MAX` microseconds.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(us))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}ms", self.0 / 1_000, self.0 % 1_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_since_never_negative() {
        let early = Tick::from_millis(5);
        let late = Tick::from_millis(12);
        assert_eq!(late.saturating_since(early), Duration::from_millis(7));
        assert_eq!(early.saturating_since(late), Duration::ZERO);
    }

    #[test]
    fn test_add_and_display() {
        let t = Tick::from_micros(1_500).saturating_add(Duration::from_micros(250));
        assert_eq!(t.as_micros(), 1_750);
        assert_eq!(t.as_millis(), 1);
        assert_eq!(t.to_string(), "1.750ms");
    }
}
