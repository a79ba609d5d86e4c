//! Prelude for turbine-sync.
//!
//! ```rust
//! use turbine_sync::prelude::*;
//!
//! let readiness = ReadinessGroup::new();
//! readiness.set(ReadyBits::NETWORK_CONNECTED);
//! assert!(readiness.bits().contains(ReadyBits::NETWORK_CONNECTED));
//! ```

pub use crate::channel::BoundedChannel;
pub use crate::counters::{ChannelSnapshot, LockSnapshot, ReadinessSnapshot};
pub use crate::error::{LockTimeout, RecvError, SendError, SyncError, SyncResult, WaitError};
pub use crate::isr::{IsrHandle, IsrSend, IsrSender};
pub use crate::readiness::{ReadinessGroup, ReadyBits};
pub use crate::shutdown::ShutdownSignal;
pub use crate::state::StateLock;
