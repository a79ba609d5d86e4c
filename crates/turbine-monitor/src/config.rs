//! Health monitor configuration.

use crate::error::{MonitorError, MonitorResult};
use crate::heap::DEFAULT_HEAP_BYTES;
use crate::stack::StackThresholds;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings shared by the stack, heap and liveness monitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Stack usage thresholds.
    pub stack: StackThresholds,
    /// A task with no completed cycle for this long is reported stale.
    pub liveness_timeout_ms: u64,
    /// Simulated heap size in bytes.
    pub heap_bytes: usize,
    /// Heap usage reported as a warning, in percent.
    pub heap_warn_percent: u32,
    /// Heap usage reported as critical, in percent.
    pub heap_critical_percent: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            stack: StackThresholds::default(),
            liveness_timeout_ms: 5000,
            heap_bytes: DEFAULT_HEAP_BYTES,
            heap_warn_percent: 80,
            heap_critical_percent: 95,
        }
    }
}

impl HealthConfig {
    /// Liveness timeout as a duration.
    #[must_use]
    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InvalidConfiguration`] for unordered stack
    /// thresholds, a zero timeout or heap, or unordered heap levels.
    pub fn validate(&self) -> MonitorResult<()> {
        if !self.stack.is_ordered() {
            return Err(MonitorError::invalid_configuration(
                "stack thresholds must satisfy rearm <= approach <= warning <= critical <= 100",
            ));
        }
        if self.liveness_timeout_ms == 0 {
            return Err(MonitorError::invalid_configuration(
                "liveness_timeout_ms must be greater than 0",
            ));
        }
        if self.heap_bytes == 0 {
            return Err(MonitorError::invalid_configuration(
                "heap_bytes must be greater than 0",
            ));
        }
        if self.heap_warn_percent > self.heap_critical_percent || self.heap_critical_percent > 100
        {
            return Err(MonitorError::invalid_configuration(
                "heap levels must satisfy warn <= critical <= 100",
            ));
        }
        Ok(())
    }
}
