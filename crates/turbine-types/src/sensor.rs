//! Sensor samples and merged readings.

use crate::tick::Tick;
use serde::{Deserialize, Serialize};

/// A single vibration sample captured in interrupt context.
///
/// Produced by the interrupt relay at a fixed rate and moved into the
/// raw-sample channel. The sensor task consumes each sample exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Vibration level in mm/s.
    pub vibration: f32,
    /// Monotonic sequence number assigned by the relay.
    pub sequence: u32,
    /// Time the sample was captured.
    pub capture_time: Tick,
}

/// A full sensor reading produced once per sensor-task cycle.
///
/// Merges the latest [`RawSample`] vibration value with the independently
/// simulated temperature, rotor speed and generator current channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Vibration level in mm/s.
    pub vibration: f32,
    /// Nacelle temperature in °C.
    pub temperature: f32,
    /// Rotor speed in revolutions per minute.
    pub rpm: f32,
    /// Generator current in amperes.
    pub current: f32,
    /// Time the reading was assembled.
    pub capture_time: Tick,
}

impl SensorReading {
    /// The reading the system boots with, before the first sensor cycle.
    pub const INITIAL: Self = Self {
        vibration: 2.45,
        temperature: 45.2,
        rpm: 20.1,
        current: 50.0,
        capture_time: Tick::ZERO,
    };
}

impl Default for SensorReading {
    fn default() -> Self {
        Self::INITIAL
    }
}
