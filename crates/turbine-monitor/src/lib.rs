//! # turbine-monitor
//!
//! Resource health monitoring for the turbine monitor tasks.
//!
//! ## Stack
//!
//! Every task thread anchors a [`StackProbe`] at the top of its body and
//! samples it inside the cycle. The deepest point of each cycle is reported to
//! the [`TaskRegistry`]; the dashboard hands the windowed minimum to the
//! [`StackMonitor`], which classifies usage and issues edge-triggered
//! warnings. An observation with no free stack goes to the [`FatalHandler`].
//!
//! ## Heap
//!
//! [`HeapBudget`] is a fixed byte budget. A failed reservation is an
//! ordinary error; the caller skips the dependent work and counts the
//! failure in [`MemoryStats`].
//!
//! ## Liveness and power
//!
//! [`TaskRegistry::check_liveness`] reports tasks that stopped completing
//! cycles. [`PowerEstimator`] turns summed busy time into an idle share and
//! an estimated power saving.
//!
//! ## Example
//!
//! ```
//! use turbine_monitor::prelude::*;
//! use turbine_types::Tick;
//!
//! #[derive(Debug)]
//! struct Ignore;
//! impl FatalHandler for Ignore {
//!     fn stack_overflow(&self, _entry: &StackMonitorEntry) {}
//! }
//!
//! let mut monitor = StackMonitor::new(StackThresholds::default());
//! let seen = monitor.observe("SensorTask", 1000, 280, Tick::ZERO, &Ignore);
//! assert!(seen.warned);
//! assert_eq!(seen.level, StackLevel::Warning);
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
pub mod error;
pub mod fatal;
pub mod heap;
pub mod power;
pub mod probe;
pub mod registry;
pub mod stack;

pub mod prelude;

pub use config::HealthConfig;
pub use error::{MonitorError, MonitorResult};
pub use fatal::{FatalHandler, HaltOnFatal};
pub use heap::{DEFAULT_HEAP_BYTES, HeapBudget, HeapLease, HeapLevel, MemoryStats};
pub use power::{PowerEstimator, PowerStats};
pub use probe::StackProbe;
pub use registry::{CycleReport, TaskRegistry, TaskState, TaskStatus};
pub use stack::{
    StackLevel, StackMonitor, StackMonitorEntry, StackObservation, StackStats, StackThresholds,
};
