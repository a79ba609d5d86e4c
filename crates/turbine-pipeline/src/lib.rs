//! # turbine-pipeline
//!
//! The concurrent sensor-to-alert pipeline of the turbine monitor.
//!
//! ## Data flow
//!
//! ```text
//! relay ──raw_samples──▶ Sensor ──sensor_data──▶ Anomaly ──alerts──▶ Network
//!                          │                       │                   │
//!                          └─────── SystemState (StateLock) ◀──────────┘
//!                                     ▲                ▲
//!                                   Safety         Dashboard
//! ```
//!
//! Each task is a plain struct implementing [`PipelineTask`]. The
//! [`MonitorRuntime`] gives every task its own named thread and
//! [`PeriodicTicker`](turbine_scheduler::PeriodicTicker), plus one thread for
//! the interrupt relay. All shared data lives in the [`PipelineContext`].
//!
//! ## Failure handling
//!
//! Nothing inside a cycle is fatal. Lock timeouts, full channels, heap
//! exhaustion and link failures are counted in the [`SystemState`] and the
//! cycle moves on. Only start-up and shutdown return [`PipelineError`].
//!
//! ## Example
//!
//! ```
//! use turbine_pipeline::prelude::*;
//!
//! # fn main() -> Result<(), PipelineError> {
//! let config = MonitorConfig::builder().with_seed(7).build()?;
//! assert_eq!(config.simulation.seed, Some(7));
//! assert_eq!(config.periods.period(TaskId::Safety).as_millis(), 50);
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
pub mod context;
pub mod error;
pub mod relay;
pub mod runtime;
pub mod sim;
pub mod state;
pub mod tasks;

pub mod prelude;

pub use config::{
    LockConfig, MonitorConfig, MonitorConfigBuilder, NetworkConfig, PeriodConfig, QueueConfig,
    SafetyConfig, SimulationConfig, StackConfig,
};
pub use context::PipelineContext;
pub use error::{PipelineError, PipelineResult};
pub use relay::{DrainSummary, InterruptRelay, RelayCounters, VibrationRegister, drain_samples};
pub use runtime::{ChannelReport, LockReport, MonitorRuntime, MonitorSnapshot};
pub use sim::SensorSimulator;
pub use state::{
    EVENT_RING_CAPACITY, EventKind, EventRing, HeapHealth, IsrStats, NetworkStats,
    ReadinessStats, SchedulingEvent, SystemState, TaskStats,
};
pub use tasks::{
    ActiveAlarms, AnomalyTask, CycleInfo, DashboardTask, NetworkTask, PacketKind, PipelineTask,
    SafetyTask, SensorTask, TaskFlow, encode_body,
};
