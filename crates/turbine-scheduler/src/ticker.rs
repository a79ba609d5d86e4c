//! Absolute-deadline periodic ticker.

use crate::error::{SchedulerError, SchedulerResult};
use crate::jitter::DeadlineMetrics;
use std::time::{Duration, Instant};
use turbine_sync::ShutdownSignal;

/// Outcome of [`PeriodicTicker::wait_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The next cycle is due.
    Due {
        /// One-based cycle number.
        cycle: u64,
        /// How far past the deadline the task was released.
        lateness: Duration,
        /// Whether the task parked before the deadline (an idle entry).
        parked: bool,
    },
    /// The shutdown signal was raised; the task should return.
    Shutdown,
}

/// Releases a task once per period on absolute deadlines.
///
/// Deadlines advance by exactly one period per cycle, so the time spent in
/// the task body does not stretch the period. When the body overruns by more
/// than a full period, the missed deadline is recorded and the schedule
/// restarts one period from now.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use turbine_scheduler::{PeriodicTicker, TickOutcome};
/// use turbine_sync::ShutdownSignal;
///
/// # fn main() -> Result<(), turbine_scheduler::SchedulerError> {
/// let shutdown = ShutdownSignal::new();
/// let mut ticker = PeriodicTicker::new("doc", Duration::from_millis(1), shutdown.clone())?;
/// assert!(matches!(ticker.wait_next(), TickOutcome::Due { cycle: 1, .. }));
/// shutdown.trigger();
/// assert_eq!(ticker.wait_next(), TickOutcome::Shutdown);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PeriodicTicker {
    name: &'static str,
    period: Duration,
    next_deadline: Instant,
    cycle: u64,
    metrics: DeadlineMetrics,
    shutdown: ShutdownSignal,
}

impl PeriodicTicker {
    /// Create a ticker whose first deadline is one period from now.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::ZeroPeriod`] for a zero period
    /// - [`SchedulerError::PeriodOverflow`] if the first deadline is unrepresentable
    pub fn new(
        name: &'static str,
        period: Duration,
        shutdown: ShutdownSignal,
    ) -> SchedulerResult<Self> {
        if period.is_zero() {
            return Err(SchedulerError::zero_period(name));
        }
        let next_deadline = Instant::now()
            .checked_add(period)
            .ok_or(SchedulerError::PeriodOverflow { name })?;
        Ok(Self {
            name,
            period,
            next_deadline,
            cycle: 0,
            metrics: DeadlineMetrics::new(),
            shutdown,
        })
    }

    /// Park until the next deadline, or return early on shutdown.
    pub fn wait_next(&mut self) -> TickOutcome {
        if self.shutdown.is_triggered() {
            return TickOutcome::Shutdown;
        }

        let deadline = self.next_deadline;
        let parked = Instant::now() < deadline;
        if parked && !self.shutdown.sleep_until(deadline) {
            return TickOutcome::Shutdown;
        }

        let released = Instant::now();
        let lateness = released.saturating_duration_since(deadline);
        let missed = lateness >= self.period;
        let lateness_us = u64::try_from(lateness.as_micros()).unwrap_or(u64::MAX);
        self.metrics.record(lateness_us, missed, parked);
        self.cycle = self.cycle.saturating_add(1);

        self.next_deadline = match deadline.checked_add(self.period) {
            Some(next) if next > released => next,
            _ => {
                tracing::debug!(
                    ticker = self.name,
                    cycle = self.cycle,
                    late_by_us = lateness_us,
                    "deadline missed, resynchronising"
                );
                released.checked_add(self.period).unwrap_or(released)
            }
        };

        TickOutcome::Due {
            cycle: self.cycle,
            lateness,
            parked,
        }
    }

    /// Restart the schedule one period from now.
    ///
    /// For owners that block between construction and their first cycle.
    /// Cycle numbering and statistics are kept.
    pub fn resync(&mut self) {
        let now = Instant::now();
        self.next_deadline = now.checked_add(self.period).unwrap_or(now);
    }

    /// Owner name given at construction.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Configured period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Cycles released so far.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Lateness statistics.
    #[must_use]
    pub fn metrics(&self) -> &DeadlineMetrics {
        &self.metrics
    }

    /// Mutable lateness statistics, for percentile queries.
    pub fn metrics_mut(&mut self) -> &mut DeadlineMetrics {
        &mut self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_zero_period_rejected() {
        let result = PeriodicTicker::new("zero", Duration::ZERO, ShutdownSignal::new());
        assert!(matches!(
            result,
            Err(SchedulerError::ZeroPeriod { name: "zero" })
        ));
    }

    #[test]
    fn test_cycles_count_up() -> TestResult {
        let mut ticker =
            PeriodicTicker::new("count", Duration::from_millis(2), ShutdownSignal::new())?;
        for expected in 1..=3 {
            match ticker.wait_next() {
                TickOutcome::Due { cycle, .. } => assert_eq!(cycle, expected),
                TickOutcome::Shutdown => return Err("unexpected shutdown".into()),
            }
        }
        assert_eq!(ticker.cycle(), 3);
        assert_eq!(ticker.metrics().snapshot().cycles, 3);
        Ok(())
    }

    #[test]
    fn test_overrun_is_recorded_as_miss() -> TestResult {
        let mut ticker =
            PeriodicTicker::new("overrun", Duration::from_millis(2), ShutdownSignal::new())?;
        std::thread::sleep(Duration::from_millis(10));
        let outcome = ticker.wait_next();
        assert!(matches!(outcome, TickOutcome::Due { parked: false, .. }));
        assert_eq!(ticker.metrics().snapshot().missed, 1);

        // Resynchronised: the next cycle parks again instead of bursting.
        let outcome = ticker.wait_next();
        assert!(matches!(outcome, TickOutcome::Due { parked: true, .. }));
        Ok(())
    }

    #[test]
    fn test_resync_discards_startup_delay() -> TestResult {
        let mut ticker =
            PeriodicTicker::new("resync", Duration::from_millis(5), ShutdownSignal::new())?;
        std::thread::sleep(Duration::from_millis(20));
        ticker.resync();

        let outcome = ticker.wait_next();
        assert!(matches!(outcome, TickOutcome::Due { cycle: 1, parked: true, .. }));
        assert_eq!(ticker.metrics().snapshot().missed, 0);
        Ok(())
    }

    #[test]
    fn test_shutdown_before_wait() -> TestResult {
        let shutdown = ShutdownSignal::new();
        let mut ticker = PeriodicTicker::new("stop", Duration::from_secs(60), shutdown.clone())?;
        shutdown.trigger();
        assert_eq!(ticker.wait_next(), TickOutcome::Shutdown);
        assert_eq!(ticker.cycle(), 0);
        Ok(())
    }
}
