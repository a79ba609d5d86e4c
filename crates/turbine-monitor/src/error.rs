//! Error types for the health monitors.
//!
//! None of these are fatal: a refused heap reservation means the caller
//! skips the dependent work for one cycle, and configuration errors are
//! reported once at start-up. Stack overflow is not an error value at all;
//! it goes straight to the [`FatalHandler`](crate::fatal::FatalHandler).

use thiserror::Error;

/// Errors reported by the health monitors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// A task was registered with no stack.
    #[error("task {task} has a zero-sized stack")]
    ZeroStack {
        /// Task name.
        task: &'static str,
    },

    /// The simulated heap cannot satisfy a reservation.
    #[error("heap exhausted: requested {requested} bytes with {free} free")]
    HeapExhausted {
        /// Bytes requested.
        requested: usize,
        /// Bytes free at the time of the request.
        free: usize,
    },

    /// A reservation of zero bytes was requested.
    #[error("heap reservations must be non-empty")]
    EmptyReservation,

    /// Invalid monitor configuration.
    #[error("invalid monitor configuration: {0}")]
    InvalidConfiguration(String),
}

impl MonitorError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Create a heap exhausted error.
    #[must_use]
    pub fn heap_exhausted(requested: usize, free: usize) -> Self {
        Self::HeapExhausted { requested, free }
    }
}

/// Result type for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;
