//! Idle-time and power-saving estimate.
//!
//! The figures produced here are a heuristic, not a measurement. Idle time
//! is inferred as the share of wall time not spent in task bodies, and the
//! saving is a fixed linear mapping of that share.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Estimated idle share and power saving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerStats {
    /// Times a task parked waiting for its next period.
    pub idle_entries: u64,
    /// Estimated share of time no task was running, in percent.
    pub idle_percent: f32,
    /// Estimated power saving, in percent. An estimate only.
    pub power_savings_percent: f32,
}

/// Derives [`PowerStats`] from busy time and wall time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerEstimator {
    stats: PowerStats,
}

impl PowerEstimator {
    /// Create an estimator with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the estimate from summed task `busy` time over `elapsed`
    /// wall time, and the running count of idle entries.
    pub fn update(&mut self, busy: Duration, elapsed: Duration, idle_entries: u64) -> PowerStats {
        let idle_percent = idle_percent(busy, elapsed);
        self.stats = PowerStats {
            idle_entries,
            idle_percent,
            power_savings_percent: savings_percent(idle_percent),
        };
        self.stats
    }

    /// Latest estimate.
    #[must_use]
    pub fn stats(&self) -> PowerStats {
        self.stats
    }
}

/// Share of `elapsed` not covered by `busy`, in percent, clamped to 0..=100.
#[must_use]
pub fn idle_percent(busy: Duration, elapsed: Duration) -> f32 {
    if elapsed.is_zero() {
        return 100.0;
    }
    let busy_fraction = busy.as_secs_f64() / elapsed.as_secs_f64();
    #[expect(
        clippy::cast_possible_truncation,
        reason = "value is clamped to 0..=100 first"
    )]
    let percent = ((1.0 - busy_fraction) * 100.0).clamp(0.0, 100.0) as f32;
    percent
}

/// Estimated saving for an idle share: `(idle - 30) * 1.2` above 70 % idle,
/// `idle / 2` otherwise.
#[must_use]
pub fn savings_percent(idle_percent: f32) -> f32 {
    if idle_percent > 70.0 {
        (idle_percent - 30.0) * 1.2
    } else {
        idle_percent / 2.0
    }
}
