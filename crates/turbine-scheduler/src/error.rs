//! Error types for the scheduler crate.

use thiserror::Error;

/// Errors raised while configuring a ticker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// A period of zero would spin without ever parking.
    #[error("period of {name} must be non-zero")]
    ZeroPeriod {
        /// Owner of the ticker.
        name: &'static str,
    },

    /// The first deadline cannot be represented on the host clock.
    #[error("period of {name} is too large for the monotonic clock")]
    PeriodOverflow {
        /// Owner of the ticker.
        name: &'static str,
    },
}

impl SchedulerError {
    /// Create a zero-period error.
    #[must_use]
    pub fn zero_period(name: &'static str) -> Self {
        Self::ZeroPeriod { name }
    }
}

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
