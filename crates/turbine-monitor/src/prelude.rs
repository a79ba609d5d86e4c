//! Prelude for turbine-monitor.

pub use crate::config::HealthConfig;
pub use crate::error::{MonitorError, MonitorResult};
pub use crate::fatal::{FatalHandler, HaltOnFatal};
pub use crate::heap::{HeapBudget, HeapLease, HeapLevel, MemoryStats};
pub use crate::power::{PowerEstimator, PowerStats};
pub use crate::probe::StackProbe;
pub use crate::registry::{CycleReport, TaskRegistry, TaskState, TaskStatus};
pub use crate::stack::{
    StackLevel, StackMonitor, StackMonitorEntry, StackObservation, StackStats, StackThresholds,
};
