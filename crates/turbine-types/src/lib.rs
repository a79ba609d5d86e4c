//! # turbine-types
//!
//! Shared data model for the turbine monitor.
//!
//! Every stage of the pipeline exchanges the types defined here: the interrupt
//! relay produces [`RawSample`]s, the sensor task publishes [`SensorReading`]s,
//! the anomaly task produces [`AnomalyResult`]s and [`AlertMessage`]s, and the
//! safety and anomaly tasks both read a [`ThresholdConfig`].
//!
//! All types are plain data: `Copy` where possible, serde-enabled so that the
//! presentation layer can serialize snapshots without extra glue.

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]

pub mod anomaly;
pub mod sensor;
pub mod task;
pub mod thresholds;
pub mod tick;

pub use anomaly::{AlertKind, AlertMessage, AnomalyResult};
pub use sensor::{RawSample, SensorReading};
pub use task::{TaskId, TaskPriority};
pub use thresholds::{ThresholdConfig, ThresholdError};
pub use tick::Tick;
