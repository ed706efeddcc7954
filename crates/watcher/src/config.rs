//! Engine configuration

use crate::error::WatchError;
use treewatch_core::record::MAX_RECORD_LEN;
use treewatch_core::EventMask;

/// Default size of the pending-event buffer, in bytes
///
/// The kernel keeps its own queue (`/proc/sys/fs/inotify/max_queued_events`),
/// so a small buffer here only costs extra reads.
pub const DEFAULT_BUFFER_SIZE: usize = 4 * 1024;

/// Watcher configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Events reported to the caller, shared by every watch of the instance
    pub mask: EventMask,

    /// Fixed capacity of the pending-event buffer (default: 4096 bytes)
    pub buffer_size: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            mask: EventMask::ALL_EVENTS,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl WatcherConfig {
    /// Config reporting only `mask`
    pub fn with_mask(mask: EventMask) -> Self {
        Self {
            mask,
            ..Self::default()
        }
    }

    /// Check values before building a watcher
    pub fn validate(&self) -> Result<(), WatchError> {
        if self.mask.is_empty() {
            return Err(WatchError::Config {
                reason: "event mask is empty".to_string(),
            });
        }

        // read(2) on an inotify fd fails with EINVAL below one maximal record
        if self.buffer_size < MAX_RECORD_LEN {
            return Err(WatchError::Config {
                reason: format!(
                    "buffer_size must be at least {} bytes, got {}",
                    MAX_RECORD_LEN, self.buffer_size
                ),
            });
        }

        Ok(())
    }
}
