//! Atomic operation counters for channels, locks and the readiness group.
//!
//! Every primitive in this crate counts its own traffic. Counters use
//! `Relaxed` ordering: they are statistics, never used for synchronization.
//! Each counter struct has a matching `Copy` snapshot for the dashboard.
//!
//! # RT Safety
//!
//! Increments are single atomic RMW operations; no allocation, no blocking.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters for one [`BoundedChannel`](crate::BoundedChannel).
#[derive(Debug, Default)]
pub struct ChannelCounters {
    sent: AtomicU64,
    received: AtomicU64,
    send_timeouts: AtomicU64,
    isr_queued: AtomicU64,
    isr_dropped: AtomicU64,
    high_water: AtomicUsize,
}

/// Point-in-time copy of [`ChannelCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    /// Items enqueued from task context.
    pub sent: u64,
    /// Items dequeued.
    pub received: u64,
    /// Task-context sends that gave up because the channel stayed full.
    pub send_timeouts: u64,
    /// Items enqueued from interrupt context.
    pub isr_queued: u64,
    /// Items dropped in interrupt context because the channel was full.
    pub isr_dropped: u64,
    /// Highest occupancy observed right after an enqueue.
    pub high_water: usize,
}

impl ChannelCounters {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_sent(&self, occupancy: usize) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.high_water.fetch_max(occupancy, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_send_timeout(&self) {
        self.send_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_isr_queued(&self, occupancy: usize) {
        self.isr_queued.fetch_add(1, Ordering::Relaxed);
        self.high_water.fetch_max(occupancy, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_isr_dropped(&self) {
        self.isr_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy all counters.
    #[must_use]
    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            send_timeouts: self.send_timeouts.load(Ordering::Relaxed),
            isr_queued: self.isr_queued.load(Ordering::Relaxed),
            isr_dropped: self.isr_dropped.load(Ordering::Relaxed),
            high_water: self.high_water.load(Ordering::Relaxed),
        }
    }
}

/// Counters for one [`StateLock`](crate::StateLock).
#[derive(Debug, Default)]
pub struct LockCounters {
    takes: AtomicU64,
    gives: AtomicU64,
    timeouts: AtomicU64,
}

/// Point-in-time copy of [`LockCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockSnapshot {
    /// Successful acquisitions.
    pub takes: u64,
    /// Releases.
    pub gives: u64,
    /// Acquisitions abandoned after the timeout.
    pub timeouts: u64,
}

impl LockSnapshot {
    /// Whether the lock is currently held, judging by the counters alone.
    ///
    /// Only exact when no other thread is mid-acquisition.
    #[must_use]
    pub fn held(&self) -> bool {
        self.takes > self.gives
    }
}

impl LockCounters {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_take(&self) {
        self.takes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_give(&self) {
        self.gives.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy all counters.
    #[must_use]
    pub fn snapshot(&self) -> LockSnapshot {
        LockSnapshot {
            takes: self.takes.load(Ordering::Relaxed),
            gives: self.gives.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Counters for the [`ReadinessGroup`](crate::ReadinessGroup).
#[derive(Debug, Default)]
pub struct ReadinessCounters {
    set_ops: AtomicU64,
    clear_ops: AtomicU64,
    wait_ops: AtomicU64,
    wait_timeouts: AtomicU64,
    wait_cancels: AtomicU64,
}

/// Point-in-time copy of [`ReadinessCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadinessSnapshot {
    /// Calls to `set`.
    pub set_ops: u64,
    /// Calls to `clear`.
    pub clear_ops: u64,
    /// Calls to `wait_all`.
    pub wait_ops: u64,
    /// Waits whose time limit elapsed without all requested bits.
    pub wait_timeouts: u64,
    /// Waits ended by cancellation.
    pub wait_cancels: u64,
}

impl ReadinessCounters {
    #[inline]
    pub(crate) fn record_set(&self) {
        self.set_ops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_clear(&self) {
        self.clear_ops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_wait(&self) {
        self.wait_ops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_wait_timeout(&self) {
        self.wait_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_wait_cancel(&self) {
        self.wait_cancels.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy all counters.
    #[must_use]
    pub fn snapshot(&self) -> ReadinessSnapshot {
        ReadinessSnapshot {
            set_ops: self.set_ops.load(Ordering::Relaxed),
            clear_ops: self.clear_ops.load(Ordering::Relaxed),
            wait_ops: self.wait_ops.load(Ordering::Relaxed),
            wait_timeouts: self.wait_timeouts.load(Ordering::Relaxed),
            wait_cancels: self.wait_cancels.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_high_water_is_max() {
        let counters = ChannelCounters::new();
        counters.record_sent(3);
        counters.record_sent(1);
        counters.record_isr_queued(2);
        let snap = counters.snapshot();
        assert_eq!(snap.sent, 2);
        assert_eq!(snap.isr_queued, 1);
        assert_eq!(snap.high_water, 3);
    }

    #[test]
    fn test_lock_held_from_counts() {
        let counters = LockCounters::new();
        counters.record_take();
        assert!(counters.snapshot().held());
        counters.record_give();
        counters.record_timeout();
        let snap = counters.snapshot();
        assert!(!snap.held());
        assert_eq!(snap.timeouts, 1);
    }
}
