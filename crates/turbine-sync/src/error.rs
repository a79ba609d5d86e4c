//! Error types for coordination primitives.
//!
//! Send and receive failures are not faults: a full channel is backpressure
//! and an empty one is a quiet cycle. They are still `Error`s so callers can
//! use `?` where skipping the rest of a cycle is the right response.

use crate::readiness::ReadyBits;
use std::time::Duration;
use thiserror::Error;

/// A send that could not enqueue its item within the timeout.
///
/// The item is handed back; disposing of it is the caller's decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError<T> {
    /// The channel stayed full for the whole timeout.
    #[error("channel is full")]
    Full(T),
}

impl<T> SendError<T> {
    /// Recover the item that was not sent.
    pub fn into_inner(self) -> T {
        match self {
            SendError::Full(item) => item,
        }
    }
}

/// A receive that found nothing within the timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecvError {
    /// The channel stayed empty for the whole timeout.
    #[error("channel is empty")]
    Empty,
}

/// A lock acquisition that did not succeed within its timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("lock '{name}' not acquired within {timeout:?}")]
pub struct LockTimeout {
    /// Name of the contended lock.
    pub name: &'static str,
    /// How long the caller was willing to wait.
    pub timeout: Duration,
}

/// Outcome of a readiness wait that did not observe all requested bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WaitError {
    /// The timeout elapsed first. Carries the bits seen at expiry.
    #[error("readiness wait timed out with bits {observed:?}")]
    TimedOut {
        /// Bits set when the wait gave up.
        observed: ReadyBits,
    },

    /// The group was cancelled while waiting.
    #[error("readiness wait cancelled")]
    Cancelled,
}

/// Construction-time errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A channel was requested with zero capacity.
    #[error("channel '{0}' must have a capacity greater than 0")]
    ZeroCapacity(&'static str),
}

/// A specialized `Result` type for construction of coordination primitives.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
