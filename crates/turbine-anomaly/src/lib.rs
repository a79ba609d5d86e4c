//! # turbine-anomaly
//!
//! Statistical anomaly detection for the turbine monitor.
//!
//! The anomaly task keeps a [`SensorHistory`] of the most recent readings and
//! hands a borrowed [`SampleWindow`] to an [`AnomalyDetector`] each cycle.
//! The shipped [`StatisticalDetector`] compares the newest sample of every
//! channel with a rolling baseline (mean and population standard deviation
//! over the last `window` samples) and with the static warning thresholds.
//!
//! ## Health score
//!
//! Starts at 100. Each channel subtracts `min(deviation / (k·σ), 1) × weight`
//! with default weights 30/25/25 for vibration, temperature and rpm. An active
//! emergency stop forces the score to 0.
//!
//! ## Example
//!
//! ```
//! use turbine_anomaly::prelude::*;
//! use turbine_types::{SensorReading, ThresholdConfig};
//!
//! # fn main() -> Result<(), DetectorError> {
//! let config = DetectorConfig::default();
//! let mut history = SensorHistory::with_capacity(config.history_len)?;
//! let mut detector = StatisticalDetector::new(config)?;
//! let ctx = DetectionContext { thresholds: ThresholdConfig::default(), emergency: false };
//!
//! history.push(&SensorReading::INITIAL);
//! let result = detector.evaluate(&history.window(), &ctx);
//! assert!(!result.any_flag());
//! # Ok(())
//! # }
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod detector;
pub mod error;
pub mod history;
pub mod throttle;

pub mod prelude;

pub use config::{ChannelWeights, DetectorConfig};
pub use detector::{AnomalyDetector, DetectionContext, StatisticalDetector};
pub use error::{DetectorError, DetectorResult};
pub use history::{Baseline, ChannelHistory, SampleWindow, SensorHistory};
pub use throttle::AlertThrottle;
