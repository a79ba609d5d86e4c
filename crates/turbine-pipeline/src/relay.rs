//! Deferred interrupt processing.
//!
//! The relay plays the role of a 100 Hz sensor interrupt. Each firing reads
//! the simulated vibration register, stamps the sample, and hands it to an
//! [`IsrSender`]. It never locks, never waits and never allocates; a full
//! channel costs one sample and one counter increment.
//!
//! The sensor task later drains the raw-sample channel in task context with
//! [`drain_samples`], which is where latency, the latest value and the
//! emergency check are worked out.

use rand::Rng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use turbine_scheduler::Clock;
use turbine_sync::{IsrSend, IsrSender};
use turbine_types::{RawSample, SensorReading, Tick};

/// The simulated vibration register.
///
/// An `f32` stored as bits in an atomic so the relay can read it without a
/// lock. The sensor task writes the latest published vibration back into it.
#[derive(Debug)]
pub struct VibrationRegister {
    bits: AtomicU32,
}

impl VibrationRegister {
    /// Create a register holding `value`.
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    /// Current value.
    #[inline]
    #[must_use]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Replace the value.
    #[inline]
    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }
}

impl Default for VibrationRegister {
    fn default() -> Self {
        Self::new(SensorReading::INITIAL.vibration)
    }
}

/// Counters written from interrupt context.
#[derive(Debug, Default)]
pub struct RelayCounters {
    interrupts: AtomicU64,
    dropped: AtomicU64,
}

impl RelayCounters {
    /// Samples captured.
    #[must_use]
    pub fn interrupts(&self) -> u64 {
        self.interrupts.load(Ordering::Relaxed)
    }

    /// Samples dropped on a full channel.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// The interrupt-context half of the relay.
pub struct InterruptRelay<S> {
    sender: S,
    register: Arc<VibrationRegister>,
    clock: Arc<dyn Clock>,
    counters: Arc<RelayCounters>,
    rng: StdRng,
    sequence: u32,
}

impl<S> std::fmt::Debug for InterruptRelay<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptRelay")
            .field("sequence", &self.sequence)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl<S: IsrSender<RawSample>> InterruptRelay<S> {
    /// Create a relay feeding `sender`.
    pub fn new(
        sender: S,
        register: Arc<VibrationRegister>,
        clock: Arc<dyn Clock>,
        counters: Arc<RelayCounters>,
        rng: StdRng,
    ) -> Self {
        Self {
            sender,
            register,
            clock,
            counters,
            rng,
            sequence: 0,
        }
    }

    /// One interrupt: capture a sample and enqueue it without waiting.
    ///
    /// The register value gets noise of -0.5..=0.4 in 0.1 steps.
    pub fn fire(&mut self) -> IsrSend<RawSample> {
        let step: i8 = self.rng.random_range(-5..5);
        let sample = RawSample {
            vibration: self.register.load() + f32::from(step) * 0.1,
            sequence: self.sequence,
            capture_time: self.clock.now(),
        };
        self.sequence = self.sequence.wrapping_add(1);
        self.counters.interrupts.fetch_add(1, Ordering::Relaxed);

        let outcome = self.sender.send_from_isr(sample);
        if !outcome.is_queued() {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }

    /// Next sequence number.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

/// What one drain of the raw-sample channel found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrainSummary {
    /// Samples consumed.
    pub processed: u64,
    /// Smallest capture-to-drain latency.
    pub min_latency_us: Option<u64>,
    /// Vibration of the newest sample.
    pub latest_vibration: Option<f32>,
    /// Samples above the emergency vibration level.
    pub emergency_samples: u64,
}

impl DrainSummary {
    /// Whether any sample called for an emergency stop.
    #[must_use]
    pub fn emergency(&self) -> bool {
        self.emergency_samples > 0
    }
}

/// Consume `samples` at `now` and summarise them.
pub fn drain_samples(
    samples: impl IntoIterator<Item = RawSample>,
    now: Tick,
    emergency_vibration: f32,
) -> DrainSummary {
    let mut summary = DrainSummary {
        processed: 0,
        min_latency_us: None,
        latest_vibration: None,
        emergency_samples: 0,
    };
    for sample in samples {
        summary.processed = summary.processed.saturating_add(1);
        let latency = u64::try_from(now.saturating_since(sample.capture_time).as_micros())
            .unwrap_or(u64::MAX);
        summary.min_latency_us = Some(summary.min_latency_us.map_or(latency, |m| m.min(latency)));
        summary.latest_vibration = Some(sample.vibration);
        if sample.vibration > emergency_vibration {
            summary.emergency_samples = summary.emergency_samples.saturating_add(1);
        }
    }
    summary
}
