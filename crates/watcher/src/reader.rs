//! Event reading
//!
//! Structural events are acted on while draining, before the caller sees
//! them: new subdirectories get watches, self-moved watches are torn down,
//! IGNORED drops table entries.

use crate::engine::Watcher;
use crate::error::WatchError;
use crate::install::Installed;
use crate::platform::Backend;
use nix::errno::Errno;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use treewatch_core::{path, Event, EventMask};

impl<B: Backend> Watcher<B> {
    /// Return the next event matching the instance mask
    ///
    /// `timeout` bounds the total time spent blocking across every internal
    /// refill; `None` blocks until an event arrives, `Some(Duration::ZERO)`
    /// only drains what is already there. Returns `Ok(None)` on timeout.
    ///
    /// `coalesce` is slept after the first event arrives and before reading,
    /// letting bursts of changes land in one batch. Keep it under a second.
    ///
    /// # Errors
    ///
    /// Every error is fatal: a failed wait or read (`Os`), a zero-byte read
    /// (`Os` with `EIO`), a partial record, an event for an unknown
    /// descriptor (a symptom of kernel queue overflow, which is not
    /// otherwise handled), or a pending-buffer overflow while backfilling a
    /// new directory.
    pub fn read(
        &mut self,
        timeout: Option<Duration>,
        coalesce: Duration,
    ) -> Result<Option<Event>, WatchError> {
        let started = Instant::now();

        loop {
            if self.pending.is_empty() {
                let remaining = timeout.map(|timeout| timeout.saturating_sub(started.elapsed()));
                if !self.refill(remaining, coalesce)? {
                    return Ok(None);
                }
            }

            while let Some(event) = self.pending.pop() {
                self.react(&event)?;
                if event.mask.intersects(self.mask) {
                    return Ok(Some(event));
                }
            }

            // Drained without anything to report; keep waiting on what's left
            if let Some(timeout) = timeout {
                if started.elapsed() >= timeout {
                    return Ok(None);
                }
            }
        }
    }

    /// Wait for and read one batch of kernel records
    ///
    /// Returns `false` if nothing arrived within `timeout`.
    fn refill(
        &mut self,
        timeout: Option<Duration>,
        coalesce: Duration,
    ) -> Result<bool, WatchError> {
        match self.backend.wait_readable(timeout) {
            Ok(true) => {}
            Ok(false) => return Ok(false),
            Err(errno) => return Err(self.fatal(WatchError::Os { op: "poll", errno })),
        }

        if !coalesce.is_zero() {
            std::thread::sleep(coalesce);
        }

        let n = match self.backend.read_bytes(&mut self.raw) {
            // EOF; possibly too many events at once
            Ok(0) => return Err(self.fatal(WatchError::Os { op: "read", errno: Errno::EIO })),
            Ok(n) => n,
            Err(errno) => return Err(self.fatal(WatchError::Os { op: "read", errno })),
        };

        if let Err(err) = self.pending.extend_from_bytes(&self.raw[..n]) {
            return Err(self.fatal(err.into()));
        }
        Ok(true)
    }

    /// Keep the table in step with one structural event
    fn react(&mut self, event: &Event) -> Result<(), WatchError> {
        let Some(watch) = self.watches.get(event.wd) else {
            return Err(self.fatal(WatchError::UnknownWatch { wd: event.wd }));
        };
        let dir = watch.path.clone();
        let recursive = watch.is_recursive();
        trace!("- {} {} ({})", event.wd, path::join(&dir, event.name()).display(), event.mask);

        // A subdirectory was created or moved in
        if event.mask.intersects(EventMask::CREATE | EventMask::MOVED_TO)
            && event.is_dir()
            && recursive
        {
            if let Some(name) = &event.name {
                let moved_in = event.mask.contains(EventMask::MOVED_TO);
                match self.install(&path::join(&dir, name), moved_in) {
                    // A recycled descriptor will see its own MOVE_SELF next;
                    // the flag keeps that from tearing it down
                    Ok((wd, Installed::Renamed | Installed::Duplicate)) if moved_in => {
                        if let Some(moved) = self.watches.get_mut(wd) {
                            moved.in_move = true;
                        }
                    }
                    Ok(_) => {}
                    Err(err) if err.is_fatal() => return Err(err),
                    // Already logged; the directory is gone again
                    Err(_) => {}
                }
            }
        }

        if event.mask.contains(EventMask::MOVE_SELF) {
            if let Some(watch) = self.watches.get_mut(event.wd) {
                if watch.in_move {
                    watch.in_move = false;
                } else if !watch.is_recursive() {
                    self.rm_watch(event.wd);
                } else {
                    // Moved out: drop the watch and everything below it.
                    // Entries go when their IGNORED events arrive.
                    let prefix = watch.path.clone();
                    let doomed: Vec<_> = self.watches.descendants(&prefix).collect();
                    for wd in doomed {
                        self.rm_watch(wd);
                    }
                }
            }
        }

        if event.mask.contains(EventMask::IGNORED) {
            if let Some(watch) = self.watches.remove(event.wd) {
                debug!("{} {} deleted", event.wd, watch.path.display());
            }
        }

        Ok(())
    }
}
