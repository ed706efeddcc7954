//! Error types for the watch engine
//!
//! Two tiers: [`WatchError::Unwatchable`] is expected and recoverable (the
//! path just isn't watched); everything else ends the current call chain.

use nix::errno::Errno;
use std::path::PathBuf;
use thiserror::Error;
use treewatch_core::{RecordError, WatchDescriptor};

/// Errors from watcher operations
#[derive(Error, Debug)]
pub enum WatchError {
    /// Path is missing, not a directory, or not readable
    #[error("cannot watch {}: {errno}", path.display())]
    Unwatchable { path: PathBuf, errno: Errno },

    /// A system call failed
    #[error("{op}() failed: {errno}")]
    Os { op: &'static str, errno: Errno },

    /// Event for a watch the table does not know about
    #[error("event for unknown watch {wd}, possibly due to event queue overflow")]
    UnknownWatch { wd: WatchDescriptor },

    /// Kernel handed back a partial record
    #[error(transparent)]
    TruncatedRecord(#[from] RecordError),

    /// Synthesized events did not fit the pending buffer
    #[error("event buffer overflow: {needed} bytes needed, capacity is {capacity}")]
    BufferOverflow { capacity: usize, needed: usize },

    /// Rejected configuration
    #[error("invalid watcher configuration: {reason}")]
    Config { reason: String },
}

impl WatchError {
    /// Originating OS error code
    ///
    /// Bookkeeping, framing, overflow and configuration failures report `EINVAL`.
    pub fn errno(&self) -> Errno {
        match self {
            WatchError::Unwatchable { errno, .. } | WatchError::Os { errno, .. } => *errno,
            WatchError::UnknownWatch { .. }
            | WatchError::TruncatedRecord(_)
            | WatchError::BufferOverflow { .. }
            | WatchError::Config { .. } => Errno::EINVAL,
        }
    }

    /// Whether the error ends the current call chain
    pub fn is_fatal(&self) -> bool {
        !matches!(self, WatchError::Unwatchable { .. })
    }
}
