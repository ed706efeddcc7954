//! The watch engine
//!
//! [`Watcher`] owns the backend, the watch table and the pending-event
//! buffer. Installing watches lives in `install.rs`, draining events in
//! `reader.rs`.

use crate::buffer::EventBuffer;
use crate::config::WatcherConfig;
use crate::error::WatchError;
use crate::log::{Log, TracingLog};
use crate::platform::Backend;
use crate::table::WatchTable;
use std::path::{Path, PathBuf};
use tracing::Level;
use treewatch_core::{path, Event, EventMask, WatchDescriptor};

/// Recursive directory watcher
///
/// Single-threaded: one caller owns the instance and drives it with
/// [`Watcher::add_watch`] and [`Watcher::read`].
pub struct Watcher<B: Backend> {
    pub(crate) backend: B,
    pub(crate) log: Box<dyn Log>,
    /// Events reported to the caller, shared by every watch
    pub(crate) mask: EventMask,
    pub(crate) watches: WatchTable,
    pub(crate) pending: EventBuffer,
    /// Scratch buffer for raw kernel reads
    pub(crate) raw: Box<[u8]>,
}

#[cfg(target_os = "linux")]
impl Watcher<crate::platform::linux::Inotify> {
    /// Create a watcher on a fresh inotify instance, logging through `tracing`
    pub fn new(config: WatcherConfig) -> Result<Self, WatchError> {
        Self::with_log(config, TracingLog)
    }

    /// Create a watcher on a fresh inotify instance with a custom log
    pub fn with_log(config: WatcherConfig, log: impl Log + 'static) -> Result<Self, WatchError> {
        let inotify = crate::platform::linux::Inotify::init()
            .map_err(|errno| WatchError::Os { op: "inotify_init1", errno })?;
        Self::with_backend(inotify, config, Box::new(log))
    }
}

impl<B: Backend> Watcher<B> {
    /// Create a watcher on an existing backend
    pub fn with_backend(
        backend: B,
        config: WatcherConfig,
        log: Box<dyn Log>,
    ) -> Result<Self, WatchError> {
        config.validate()?;

        Ok(Self {
            backend,
            log,
            mask: config.mask,
            watches: WatchTable::new(),
            pending: EventBuffer::with_capacity(config.buffer_size),
            raw: vec![0u8; config.buffer_size].into_boxed_slice(),
        })
    }

    /// Events reported to the caller
    pub fn mask(&self) -> EventMask {
        self.mask
    }

    /// Read-only view of the watch table
    pub fn watches(&self) -> &WatchTable {
        &self.watches
    }

    /// Number of records waiting to be drained
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Path watched by `wd`
    pub fn path(&self, wd: WatchDescriptor) -> Result<&Path, WatchError> {
        self.watches
            .path(wd)
            .ok_or(WatchError::UnknownWatch { wd })
    }

    /// Full path of the subject of `event`
    pub fn event_path(&self, event: &Event) -> Result<PathBuf, WatchError> {
        let dir = self.path(event.wd)?;
        Ok(path::join(dir, event.name()))
    }

    /// Ask the kernel to drop a watch
    ///
    /// Best effort: failures are logged, never returned. The table entry is
    /// dropped once the kernel confirms with IGNORED.
    pub fn rm_watch(&mut self, wd: WatchDescriptor) {
        if let Err(errno) = self.backend.rm_watch(wd) {
            self.log.log(
                Level::WARN,
                format_args!("inotify_rm_watch() failed for {}: {}", wd, errno),
            );
        }
    }

    /// Drop every watch; the watcher stays usable
    pub fn rm_all_watches(&mut self) {
        let all: Vec<_> = self.watches.descriptors().collect();
        for wd in all {
            self.rm_watch(wd);
        }
    }

    /// Report a fatal error through the log and hand it back
    pub(crate) fn fatal(&self, err: WatchError) -> WatchError {
        self.log.log(Level::ERROR, format_args!("{}", err));
        err
    }

    #[cfg(test)]
    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: Backend> std::fmt::Debug for Watcher<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("mask", &self.mask)
            .field("watches", &self.watches)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
