//! Platform-specific watch primitives
//!
//! The engine only needs four flat, single-directory operations from the
//! OS. [`Backend`] is that seam; Linux implements it on inotify.

#[cfg(target_os = "linux")]
pub mod linux;

use nix::errno::Errno;
use std::path::Path;
use std::time::Duration;
use treewatch_core::{EventMask, WatchDescriptor};

/// Flat, non-recursive directory watch primitive
pub trait Backend {
    /// Register (or re-register) a watch on `path`
    ///
    /// Returns the descriptor already in use if the directory is watched.
    fn add_watch(&mut self, path: &Path, mask: EventMask) -> Result<WatchDescriptor, Errno>;

    /// Ask the OS to drop a watch; an IGNORED event confirms it later
    fn rm_watch(&mut self, wd: WatchDescriptor) -> Result<(), Errno>;

    /// Wait until events can be read
    ///
    /// `None` waits forever. Returns `false` on timeout.
    fn wait_readable(&mut self, timeout: Option<Duration>) -> Result<bool, Errno>;

    /// Read a batch of framed event records into `buf`
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, Errno>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn add_watch(&mut self, path: &Path, mask: EventMask) -> Result<WatchDescriptor, Errno> {
        (**self).add_watch(path, mask)
    }

    fn rm_watch(&mut self, wd: WatchDescriptor) -> Result<(), Errno> {
        (**self).rm_watch(wd)
    }

    fn wait_readable(&mut self, timeout: Option<Duration>) -> Result<bool, Errno> {
        (**self).wait_readable(timeout)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, Errno> {
        (**self).read_bytes(buf)
    }
}
