//! # turbine-sync
//!
//! Coordination primitives for the turbine monitor pipeline.
//!
//! The pipeline's tasks never share data except through the types in this
//! crate. Every blocking operation is bounded by a timeout so that the
//! highest-priority consumer has a predictable worst case.
//!
//! ## Architecture
//!
//! - [`channel`] - fixed-capacity FIFO channels with timeout-bounded send/receive
//! - [`isr`] - the restricted, never-waiting sender handed to interrupt context
//! - [`state`] - [`StateLock`], the only way to touch shared mutable state
//! - [`readiness`] - multi-bit startup signaling with AND-wait semantics
//! - [`shutdown`] - cooperative stop signal with interruptible sleeps
//! - [`counters`] - atomic operation counters with `Copy` snapshots
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use turbine_sync::prelude::*;
//!
//! let channel = BoundedChannel::new("readings", 2)?;
//! channel.try_send(1u32, Duration::ZERO)?;
//! channel.try_send(2u32, Duration::ZERO)?;
//! assert!(channel.try_send(3u32, Duration::ZERO).is_err());
//!
//! let state = StateLock::new("counter", 0u64);
//! state.with_lock(Duration::from_millis(10), |value| *value += 1)?;
//!
//! let readiness = ReadinessGroup::new();
//! readiness.set(ReadyBits::ALL);
//! readiness.wait_all(ReadyBits::ALL, Some(Duration::ZERO))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]

pub mod channel;
pub mod counters;
pub mod error;
pub mod isr;
pub mod readiness;
pub mod shutdown;
pub mod state;

pub mod prelude;

pub use channel::BoundedChannel;
pub use counters::{
    ChannelCounters, ChannelSnapshot, LockCounters, LockSnapshot, ReadinessCounters,
    ReadinessSnapshot,
};
pub use error::{LockTimeout, RecvError, SendError, SyncError, SyncResult, WaitError};
pub use isr::{IsrHandle, IsrSend, IsrSender};
pub use readiness::{ReadinessGroup, ReadyBits};
pub use shutdown::ShutdownSignal;
pub use state::StateLock;
