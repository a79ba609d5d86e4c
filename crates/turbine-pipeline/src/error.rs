//! Error types for the pipeline.
//!
//! Everything here is a start-up or shutdown failure. Faults inside a
//! running cycle are handled where they occur (counted and skipped) and never
//! surface as a [`PipelineError`].

use thiserror::Error;
use turbine_anomaly::DetectorError;
use turbine_monitor::MonitorError;
use turbine_scheduler::SchedulerError;
use turbine_sync::{LockTimeout, SyncError};
use turbine_types::ThresholdError;

/// Errors raised while building, running or stopping the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The alarm thresholds are inconsistent.
    #[error(transparent)]
    Thresholds(#[from] ThresholdError),

    /// The detector rejected its configuration.
    #[error(transparent)]
    Detector(#[from] DetectorError),

    /// A health monitor rejected its configuration.
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    /// A task period could not be scheduled.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// A channel could not be created.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The shared state stayed locked past the snapshot timeout.
    #[error(transparent)]
    Snapshot(#[from] LockTimeout),

    /// A task thread could not be spawned.
    #[error("failed to spawn {task}: {source}")]
    Spawn {
        /// Task name.
        task: &'static str,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A task thread panicked.
    #[error("task {task} panicked")]
    TaskPanicked {
        /// Task name.
        task: &'static str,
    },
}

impl PipelineError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
