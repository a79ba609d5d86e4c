//! Fixed-capacity FIFO channels.
//!
//! A [`BoundedChannel`] carries data between two pipeline stages. It is
//! cloneable; every clone refers to the same queue. Capacity is fixed at
//! construction and occupancy never exceeds it.
//!
//! # Overflow Behavior
//!
//! A send that finds the channel full waits up to its timeout and then hands
//! the item back in [`SendError::Full`]. Nothing is buffered beyond the
//! configured capacity: dropping is preferred over unbounded memory and
//! latency growth.
//!
//! # Timeouts
//!
//! `Duration::ZERO` means "do not wait at all". Any other timeout is an upper
//! bound on how long the calling task suspends.

use crate::counters::{ChannelCounters, ChannelSnapshot};
use crate::error::{RecvError, SendError, SyncError, SyncResult};
use crate::isr::IsrHandle;
use crossbeam::channel::{self, Receiver, Sender};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Bounded multi-producer multi-consumer FIFO channel.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use turbine_sync::BoundedChannel;
///
/// let channel = BoundedChannel::new("alerts", 3)?;
/// channel.try_send("first", Duration::ZERO)?;
/// channel.try_send("second", Duration::ZERO)?;
/// assert_eq!(channel.try_receive(Duration::ZERO), Ok("first"));
/// assert_eq!(channel.len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct BoundedChannel<T> {
    name: &'static str,
    tx: Sender<T>,
    rx: Receiver<T>,
    capacity: usize,
    waiting_receivers: Arc<AtomicUsize>,
    counters: Arc<ChannelCounters>,
}

impl<T> Clone for BoundedChannel<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            capacity: self.capacity,
            waiting_receivers: Arc::clone(&self.waiting_receivers),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<T> fmt::Debug for BoundedChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedChannel")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("len", &self.rx.len())
            .finish_non_exhaustive()
    }
}

impl<T> BoundedChannel<T> {
    /// Create a channel holding at most `capacity` items.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ZeroCapacity`] if `capacity` is 0.
    pub fn new(name: &'static str, capacity: usize) -> SyncResult<Self> {
        if capacity == 0 {
            return Err(SyncError::ZeroCapacity(name));
        }
        let (tx, rx) = channel::bounded(capacity);
        Ok(Self {
            name,
            tx,
            rx,
            capacity,
            waiting_receivers: Arc::new(AtomicUsize::new(0)),
            counters: Arc::new(ChannelCounters::new()),
        })
    }

    /// Enqueue `item`, waiting up to `timeout` for space.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Full`] carrying the item if the channel stayed
    /// full for the whole timeout.
    pub fn try_send(&self, item: T, timeout: Duration) -> Result<(), SendError<T>> {
        let result = if timeout.is_zero() {
            self.tx.try_send(item).map_err(channel::TrySendError::into_inner)
        } else {
            self.tx
                .send_timeout(item, timeout)
                .map_err(channel::SendTimeoutError::into_inner)
        };

        match result {
            Ok(()) => {
                self.counters.record_sent(self.tx.len());
                Ok(())
            }
            Err(item) => {
                self.counters.record_send_timeout();
                tracing::trace!(channel = self.name, "send timed out on full channel");
                Err(SendError::Full(item))
            }
        }
    }

    /// Dequeue the oldest item, waiting up to `timeout` for one to arrive.
    ///
    /// # Errors
    ///
    /// Returns [`RecvError::Empty`] if nothing arrived within the timeout.
    pub fn try_receive(&self, timeout: Duration) -> Result<T, RecvError> {
        let result = if timeout.is_zero() {
            self.rx.try_recv().ok().ok_or(RecvError::Empty)
        } else {
            self.waiting_receivers.fetch_add(1, Ordering::AcqRel);
            let received = self.rx.recv_timeout(timeout).ok().ok_or(RecvError::Empty);
            self.waiting_receivers.fetch_sub(1, Ordering::AcqRel);
            received
        };

        if result.is_ok() {
            self.counters.record_received();
        }
        result
    }

    /// Take every item currently queued, oldest first, without waiting.
    pub fn drain(&self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.try_receive(Duration::ZERO).ok())
    }

    /// Restricted sender for interrupt context.
    #[must_use]
    pub fn isr_handle(&self) -> IsrHandle<T> {
        IsrHandle::new(self.clone())
    }

    /// Non-blocking enqueue used by [`IsrHandle`].
    pub(crate) fn push_nonblocking(&self, item: T) -> Result<bool, T> {
        match self.tx.try_send(item) {
            Ok(()) => {
                self.counters.record_isr_queued(self.tx.len());
                Ok(self.waiting_receivers.load(Ordering::Acquire) > 0)
            }
            Err(err) => {
                self.counters.record_isr_dropped();
                Err(err.into_inner())
            }
        }
    }

    /// Channel name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no items are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Whether the channel is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.rx.is_full()
    }

    /// Number of consumers currently blocked in [`try_receive`](Self::try_receive).
    #[must_use]
    pub fn waiting_receivers(&self) -> usize {
        self.waiting_receivers.load(Ordering::Acquire)
    }

    /// Traffic counters.
    #[must_use]
    pub fn stats(&self) -> ChannelSnapshot {
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            BoundedChannel::<u8>::new("empty", 0),
            Err(SyncError::ZeroCapacity("empty"))
        ));
    }

    #[test]
    fn test_full_channel_returns_item() -> TestResult {
        let channel = BoundedChannel::new("test", 1)?;
        channel.try_send(10u32, Duration::ZERO)?;
        let err = channel.try_send(11u32, Duration::from_millis(5));
        assert_eq!(err, Err(SendError::Full(11)));
        assert_eq!(channel.len(), 1);
        assert_eq!(channel.stats().send_timeouts, 1);
        Ok(())
    }

    #[test]
    fn test_empty_receive_times_out() -> TestResult {
        let channel = BoundedChannel::<u32>::new("test", 2)?;
        assert_eq!(
            channel.try_receive(Duration::from_millis(2)),
            Err(RecvError::Empty)
        );
        assert_eq!(channel.waiting_receivers(), 0);
        Ok(())
    }

    #[test]
    fn test_drain_preserves_order() -> TestResult {
        let channel = BoundedChannel::new("test", 4)?;
        for i in 0..4u32 {
            channel.try_send(i, Duration::ZERO)?;
        }
        let drained: Vec<u32> = channel.drain().collect();
        assert_eq!(drained, vec![0, 1, 2, 3]);
        assert!(channel.is_empty());
        let stats = channel.stats();
        assert_eq!(stats.sent, 4);
        assert_eq!(stats.received, 4);
        assert_eq!(stats.high_water, 4);
        Ok(())
    }

    #[test]
    fn test_clones_share_queue() -> TestResult {
        let producer = BoundedChannel::new("test", 2)?;
        let consumer = producer.clone();
        producer.try_send('a', Duration::ZERO)?;
        assert_eq!(consumer.try_receive(Duration::ZERO), Ok('a'));
        Ok(())
    }
}
