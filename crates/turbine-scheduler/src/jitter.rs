//! Deadline lateness tracking.
//!
//! Each ticker records, per cycle, how late it woke relative to its absolute
//! deadline and whether the deadline had already passed before it could park.

/// Lateness statistics for one periodic task.
///
/// Keeps a bounded ring of recent samples for percentile estimation; the
/// ring and its scratch buffer are allocated once at construction.
#[derive(Debug, Clone)]
pub struct DeadlineMetrics {
    cycles: u64,
    missed: u64,
    parks: u64,
    max_lateness_us: u64,
    last_lateness_us: u64,
    recent: Vec<u64>,
    capacity: usize,
    next_slot: usize,
    scratch: Vec<u64>,
}

/// A copyable view of [`DeadlineMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeadlineSnapshot {
    /// Cycles released.
    pub cycles: u64,
    /// Cycles whose deadline had passed before the task could park.
    pub missed: u64,
    /// Times the task parked waiting for its deadline.
    pub parks: u64,
    /// Worst observed lateness.
    pub max_lateness_us: u64,
    /// Most recent lateness.
    pub last_lateness_us: u64,
}

impl Default for DeadlineMetrics {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SAMPLES)
    }
}

const DEFAULT_SAMPLES: usize = 256;

impl DeadlineMetrics {
    /// Create metrics with the default sample capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create metrics keeping the `capacity` most recent samples.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cycles: 0,
            missed: 0,
            parks: 0,
            max_lateness_us: 0,
            last_lateness_us: 0,
            recent: Vec::with_capacity(capacity),
            capacity,
            next_slot: 0,
            scratch: Vec::with_capacity(capacity),
        }
    }

    /// Record one released cycle.
    pub fn record(&mut self, lateness_us: u64, missed: bool, parked: bool) {
        self.cycles = self.cycles.saturating_add(1);
        if missed {
            self.missed = self.missed.saturating_add(1);
        }
        if parked {
            self.parks = self.parks.saturating_add(1);
        }
        self.max_lateness_us = self.max_lateness_us.max(lateness_us);
        self.last_lateness_us = lateness_us;

        if self.capacity == 0 {
            return;
        }
        if self.recent.len() < self.capacity {
            self.recent.push(lateness_us);
        } else if let Some(slot) = self.recent.get_mut(self.next_slot) {
            *slot = lateness_us;
            self.next_slot = (self.next_slot + 1) % self.capacity;
        }
    }

    /// Lateness at `percent` (0 to 100) over the retained samples.
    pub fn percentile_us(&mut self, percent: u8) -> u64 {
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.recent);
        let len = self.scratch.len();
        let Some(last) = len.checked_sub(1) else {
            return 0;
        };
        let index = (len * usize::from(percent.min(100)) / 100).min(last);
        let (_, value, _) = self.scratch.select_nth_unstable(index);
        *value
    }

    /// 99th percentile lateness.
    pub fn p99_us(&mut self) -> u64 {
        self.percentile_us(99)
    }

    /// Number of retained samples.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.recent.len()
    }

    /// Copy of the counters.
    #[must_use]
    pub fn snapshot(&self) -> DeadlineSnapshot {
        DeadlineSnapshot {
            cycles: self.cycles,
            missed: self.missed,
            parks: self.parks,
            max_lateness_us: self.max_lateness_us,
            last_lateness_us: self.last_lateness_us,
        }
    }
}
