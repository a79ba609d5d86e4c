//! Fixed-length sample histories and window baselines.

use crate::error::{DetectorError, DetectorResult};
use turbine_types::SensorReading;

/// Mean and population standard deviation over a window of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    /// Window mean.
    pub mean: f32,
    /// Population standard deviation of the window.
    pub std_dev: f32,
    /// Samples the baseline was computed over.
    pub samples: usize,
}

impl Baseline {
    /// Compute the baseline of `values`, or `None` when empty.
    #[must_use]
    pub fn of(values: impl Iterator<Item = f32> + Clone) -> Option<Self> {
        let (count, sum) = values
            .clone()
            .fold((0usize, 0.0f32), |(n, sum), v| (n + 1, sum + v));
        if count == 0 {
            return None;
        }
        let n = count as f32;
        let mean = sum / n;
        let sum_sq = values.fold(0.0f32, |acc, v| {
            let diff = v - mean;
            acc + diff * diff
        });
        Some(Self {
            mean,
            std_dev: (sum_sq / n).sqrt(),
            samples: count,
        })
    }

    /// Absolute deviation of `value` from the mean.
    #[must_use]
    pub fn deviation(&self, value: f32) -> f32 {
        (value - self.mean).abs()
    }

    /// Whether `value` lies outside `sigmas` standard deviations.
    #[must_use]
    pub fn exceeds(&self, value: f32, sigmas: f32) -> bool {
        self.deviation(value) > sigmas * self.std_dev
    }

    /// Deviation as a fraction of the `sigmas` band, capped at 1.
    ///
    /// A flat window (zero deviation band) yields 1 for any departure from
    /// the mean and 0 for a value exactly on it.
    #[must_use]
    pub fn band_ratio(&self, value: f32, sigmas: f32) -> f32 {
        let deviation = self.deviation(value);
        let band = sigmas * self.std_dev;
        if band > 0.0 {
            (deviation / band).min(1.0)
        } else if deviation > 0.0 {
            1.0
        } else {
            0.0
        }
    }
}

/// Circular history of one sensor channel.
///
/// Storage is reserved once; after the history fills, each push overwrites
/// the oldest sample.
#[derive(Debug, Clone)]
pub struct ChannelHistory {
    samples: Vec<f32>,
    capacity: usize,
    next: usize,
    total: u64,
}

impl ChannelHistory {
    /// Create an empty history holding at most `capacity` samples.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::ZeroCapacity`] for a zero capacity.
    pub fn with_capacity(capacity: usize) -> DetectorResult<Self> {
        if capacity == 0 {
            return Err(DetectorError::ZeroCapacity);
        }
        Ok(Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            next: 0,
            total: 0,
        })
    }

    /// Append a sample, evicting the oldest once full.
    pub fn push(&mut self, value: f32) {
        if self.samples.len() < self.capacity {
            self.samples.push(value);
            self.next = self.samples.len() % self.capacity;
        } else if let Some(slot) = self.samples.get_mut(self.next) {
            *slot = value;
            self.next = (self.next + 1) % self.capacity;
        }
        self.total = self.total.saturating_add(1);
    }

    /// Samples currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample has been pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum samples held.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples pushed over the history's lifetime.
    #[must_use]
    pub fn total_pushed(&self) -> u64 {
        self.total
    }

    /// Most recently pushed sample.
    #[must_use]
    pub fn latest(&self) -> Option<f32> {
        self.recent(1).next()
    }

    /// The `n` most recent samples, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = f32> + Clone + '_ {
        let (newer_half, older_half) = self.samples.split_at(self.next.min(self.samples.len()));
        let skip = self.samples.len().saturating_sub(n);
        older_half
            .iter()
            .chain(newer_half.iter())
            .copied()
            .skip(skip)
    }

    /// Baseline over the `window` most recent samples (fewer while filling).
    #[must_use]
    pub fn baseline(&self, window: usize) -> Option<Baseline> {
        Baseline::of(self.recent(window))
    }
}

/// Histories of the three monitored channels, advanced together.
#[derive(Debug, Clone)]
pub struct SensorHistory {
    vibration: ChannelHistory,
    temperature: ChannelHistory,
    rpm: ChannelHistory,
}

impl SensorHistory {
    /// Create histories holding `capacity` samples each.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::ZeroCapacity`] for a zero capacity.
    pub fn with_capacity(capacity: usize) -> DetectorResult<Self> {
        Ok(Self {
            vibration: ChannelHistory::with_capacity(capacity)?,
            temperature: ChannelHistory::with_capacity(capacity)?,
            rpm: ChannelHistory::with_capacity(capacity)?,
        })
    }

    /// Append one reading to every channel.
    pub fn push(&mut self, reading: &SensorReading) {
        self.vibration.push(reading.vibration);
        self.temperature.push(reading.temperature);
        self.rpm.push(reading.rpm);
    }

    /// Samples held per channel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vibration.len()
    }

    /// Whether no reading has been pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vibration.is_empty()
    }

    /// Readings pushed over the history's lifetime.
    #[must_use]
    pub fn total_pushed(&self) -> u64 {
        self.vibration.total_pushed()
    }

    /// Borrowed view for a detector.
    #[must_use]
    pub fn window(&self) -> SampleWindow<'_> {
        SampleWindow {
            vibration: &self.vibration,
            temperature: &self.temperature,
            rpm: &self.rpm,
        }
    }
}

/// A read-only view of the channel histories handed to a detector.
#[derive(Debug, Clone, Copy)]
pub struct SampleWindow<'a> {
    /// Vibration history.
    pub vibration: &'a ChannelHistory,
    /// Temperature history.
    pub temperature: &'a ChannelHistory,
    /// Rotor speed history.
    pub rpm: &'a ChannelHistory,
}

impl SampleWindow<'_> {
    /// Samples held per channel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vibration.len()
    }

    /// Whether the histories are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vibration.is_empty()
    }
}
