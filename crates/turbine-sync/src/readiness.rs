//! Multi-bit readiness signaling.
//!
//! Three producers each own one bit: the sensor task sets
//! [`ReadyBits::SENSORS_CALIBRATED`] once, the anomaly task sets
//! [`ReadyBits::ANOMALY_READY`] once, and the network task sets and clears
//! [`ReadyBits::NETWORK_CONNECTED`] as the link comes and goes. The safety
//! task blocks in [`ReadinessGroup::wait_all`] until every bit is set at the
//! same time.
//!
//! Waiting never clears bits. A wait can be bounded by a timeout, and
//! [`ReadinessGroup::cancel`] releases every current and future waiter so a
//! dead producer cannot stall shutdown.

use crate::counters::{ReadinessCounters, ReadinessSnapshot};
use crate::error::WaitError;
use bitflags::bitflags;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

bitflags! {
    /// Readiness bits of the pipeline.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ReadyBits: u32 {
        /// The sensor task finished calibration.
        const SENSORS_CALIBRATED = 1 << 0;
        /// The network link is up.
        const NETWORK_CONNECTED = 1 << 1;
        /// The anomaly detector has a full baseline window.
        const ANOMALY_READY = 1 << 2;
        /// Every subsystem is ready.
        const ALL = Self::SENSORS_CALIBRATED.bits()
            | Self::NETWORK_CONNECTED.bits()
            | Self::ANOMALY_READY.bits();
    }
}

#[derive(Debug, Default)]
struct GroupState {
    bits: ReadyBits,
    cancelled: bool,
}

/// A readiness register with AND-wait semantics.
#[derive(Debug, Default)]
pub struct ReadinessGroup {
    state: Mutex<GroupState>,
    changed: Condvar,
    counters: ReadinessCounters,
}

impl ReadinessGroup {
    /// Create a group with no bits set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `mask` and wake waiters. Returns the bits after the update.
    pub fn set(&self, mask: ReadyBits) -> ReadyBits {
        let bits = {
            let mut state = self.state.lock();
            state.bits.insert(mask);
            state.bits
        };
        self.counters.record_set();
        self.changed.notify_all();
        tracing::debug!(?mask, ?bits, "readiness bits set");
        bits
    }

    /// Clear `mask`. Returns the bits after the update.
    pub fn clear(&self, mask: ReadyBits) -> ReadyBits {
        let bits = {
            let mut state = self.state.lock();
            state.bits.remove(mask);
            state.bits
        };
        self.counters.record_clear();
        tracing::debug!(?mask, ?bits, "readiness bits cleared");
        bits
    }

    /// Current bits.
    #[must_use]
    pub fn bits(&self) -> ReadyBits {
        self.state.lock().bits
    }

    /// Block until every bit in `mask` is set at once.
    ///
    /// `None` waits without a time limit; only [`cancel`](Self::cancel)
    /// ends such a wait early. Returns the full register as observed when
    /// the condition held.
    ///
    /// # Errors
    ///
    /// - [`WaitError::TimedOut`] if the timeout elapsed first
    /// - [`WaitError::Cancelled`] if the group was cancelled
    pub fn wait_all(
        &self,
        mask: ReadyBits,
        timeout: Option<Duration>,
    ) -> Result<ReadyBits, WaitError> {
        self.counters.record_wait();
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        let mut state = self.state.lock();
        loop {
            if state.cancelled {
                self.counters.record_wait_cancel();
                return Err(WaitError::Cancelled);
            }
            if state.bits.contains(mask) {
                return Ok(state.bits);
            }

            match deadline {
                Some(deadline) => {
                    if self.changed.wait_until(&mut state, deadline).timed_out() {
                        if state.bits.contains(mask) && !state.cancelled {
                            return Ok(state.bits);
                        }
                        self.counters.record_wait_timeout();
                        return Err(WaitError::TimedOut {
                            observed: state.bits,
                        });
                    }
                }
                // No timeout, or one too large to represent as an instant.
                None => self.changed.wait(&mut state),
            }
        }
    }

    /// Release every waiter with [`WaitError::Cancelled`], now and later.
    pub fn cancel(&self) {
        self.state.lock().cancelled = true;
        self.changed.notify_all();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    /// Operation counters.
    #[must_use]
    pub fn stats(&self) -> ReadinessSnapshot {
        self.counters.snapshot()
    }
}
