//! Interrupt-context sending.
//!
//! Code running in interrupt context may not wait, lock, or allocate. It is
//! therefore never given a [`BoundedChannel`] directly, only something
//! implementing [`IsrSender`], whose single operation returns immediately.
//!
//! # RT Safety
//!
//! `send_from_isr` performs one non-blocking enqueue attempt and a counter
//! update. On a full channel the item is handed back as
//! [`IsrSend::Dropped`]; the interrupt handler counts the loss and returns.

use crate::channel::BoundedChannel;
use crate::counters::ChannelSnapshot;
use std::fmt;

/// Outcome of a send from interrupt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsrSend<T> {
    /// The item was queued.
    Queued {
        /// A consumer was blocked waiting for data and should run as soon as
        /// the interrupt handler returns.
        higher_priority_woken: bool,
    },
    /// The channel was full; the item is returned undelivered.
    Dropped(T),
}

impl<T> IsrSend<T> {
    /// Whether the item was queued.
    #[must_use]
    pub fn is_queued(&self) -> bool {
        matches!(self, IsrSend::Queued { .. })
    }
}

/// A sender usable from interrupt context. It never waits.
pub trait IsrSender<T>: Send + Sync {
    /// Attempt to enqueue `item` without waiting.
    fn send_from_isr(&self, item: T) -> IsrSend<T>;
}

/// The interrupt-safe view of a [`BoundedChannel`].
///
/// Exposes only the non-blocking enqueue and read-only statistics.
pub struct IsrHandle<T> {
    channel: BoundedChannel<T>,
}

impl<T> IsrHandle<T> {
    pub(crate) fn new(channel: BoundedChannel<T>) -> Self {
        Self { channel }
    }

    /// Traffic counters of the underlying channel.
    #[must_use]
    pub fn stats(&self) -> ChannelSnapshot {
        self.channel.stats()
    }
}

impl<T> Clone for IsrHandle<T> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
        }
    }
}

impl<T> fmt::Debug for IsrHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsrHandle")
            .field("channel", &self.channel.name())
            .finish()
    }
}

impl<T: Send> IsrSender<T> for IsrHandle<T> {
    #[inline]
    fn send_from_isr(&self, item: T) -> IsrSend<T> {
        match self.channel.push_nonblocking(item) {
            Ok(higher_priority_woken) => IsrSend::Queued {
                higher_priority_woken,
            },
            Err(item) => IsrSend::Dropped(item),
        }
    }
}
