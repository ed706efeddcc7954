//! Watch installation
//!
//! inotify reuses the descriptor of a directory that is already watched,
//! even under a new name. The table is reconciled against that here:
//! a known descriptor under a new path is a rename (or a shallow watch
//! deepened to recursive), under the same path a no-op.

use crate::engine::Watcher;
use crate::error::WatchError;
use crate::platform::Backend;
use nix::errno::Errno;
use std::path::Path;
use tracing::{debug, Level};
use treewatch_core::{path, Event, EventMask, WatchDescriptor};
use walkdir::WalkDir;

/// What registering a path did to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Installed {
    /// Descriptor was new
    Created,
    /// Known descriptor, path updated
    Renamed,
    /// Known descriptor, nothing changed
    Duplicate,
}

impl<B: Backend> Watcher<B> {
    /// Watch the directory at `path`
    ///
    /// A path ending in `/` is watched shallowly; any other path recursively.
    /// Adding a path that is already watched (or the shallow spelling of a
    /// recursive watch) is a no-op returning the same descriptor.
    ///
    /// `in_move` decides what happens to entries already in the directory:
    /// - `true`: subdirectories of a recursive watch get their own watches,
    ///   silently. Use this for moved-in trees and for initial setup.
    /// - `false`: every immediate child is queued as a `CREATE` event for
    ///   [`Watcher::read`], so a freshly created directory loses nothing.
    ///   Children the kernel also reports show up twice.
    ///
    /// Returns the descriptor of `path` only.
    ///
    /// # Errors
    ///
    /// [`WatchError::Unwatchable`] (logged, recoverable) when `path` is empty,
    /// missing, not a directory or not readable. [`WatchError::BufferOverflow`]
    /// (fatal) when the queued `CREATE` events don't fit the pending buffer.
    pub fn add_watch(
        &mut self,
        path: impl AsRef<Path>,
        in_move: bool,
    ) -> Result<WatchDescriptor, WatchError> {
        self.install(path.as_ref(), in_move).map(|(wd, _)| wd)
    }

    pub(crate) fn install(
        &mut self,
        path: &Path,
        in_move: bool,
    ) -> Result<(WatchDescriptor, Installed), WatchError> {
        if path.as_os_str().is_empty() {
            return Err(self.unwatchable(path, Errno::ENOENT));
        }

        let recursive = !path::is_shallow(path);
        let mask = self.registration_mask(recursive);
        let wd = match self.backend.add_watch(path, mask) {
            Ok(wd) => wd,
            Err(errno) => return Err(self.unwatchable(path, errno)),
        };

        let installed = match self.watches.get(wd) {
            None => {
                debug!("{} {} created", wd, path.display());
                self.watches.insert(wd, path.to_path_buf());
                Installed::Created
            }
            Some(watch) if path::is_same_watch(&watch.path, path) => {
                debug!("{} {} ignored as a duplicate", wd, path.display());
                if recursive || !watch.is_recursive() {
                    return Ok((wd, Installed::Duplicate));
                }

                // The shallow spelling just replaced the kernel mask of a
                // recursive watch; put the recursive one back
                let stored = watch.path.clone();
                let mask = self.registration_mask(true);
                if let Err(errno) = self.backend.add_watch(&stored, mask) {
                    return Err(self.unwatchable(&stored, errno));
                }
                return Ok((wd, Installed::Duplicate));
            }
            Some(watch) => {
                let change = if path::is_deepened(&watch.path, path) {
                    "changed to recursive"
                } else {
                    "moved"
                };
                debug!("{} {} {}", wd, path.display(), change);
                self.watches.set_path(wd, path.to_path_buf());
                Installed::Renamed
            }
        };

        if in_move {
            if recursive {
                self.watch_subdirectories(path)?;
            }
        } else {
            self.queue_children(wd, path, recursive)?;
        }

        Ok((wd, installed))
    }

    /// Kernel mask for a watch of this instance
    fn registration_mask(&self, recursive: bool) -> EventMask {
        let mask = self.mask | EventMask::ONLYDIR | EventMask::MOVE_SELF;
        if recursive {
            mask | EventMask::CREATE | EventMask::MOVED_TO
        } else {
            mask
        }
    }

    /// Silently watch every subdirectory below `dir`
    ///
    /// Children of a moved-in tree arrive together with it, so the kernel
    /// never reports them. Already-watched subdirectories come back with
    /// their old descriptors and get their paths updated.
    fn watch_subdirectories(&mut self, dir: &Path) -> Result<(), WatchError> {
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.log.log(
                        Level::WARN,
                        format_args!("cannot list {}: {}", dir.display(), err),
                    );
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            let subdir = path::join(dir, entry.file_name());
            match self.install(&subdir, true) {
                Ok(_) => {}
                Err(err) if err.is_fatal() => return Err(err),
                // Already logged; the subdirectory raced away
                Err(_) => {}
            }
        }
        Ok(())
    }

    /// Queue a synthesized `CREATE` for every immediate child of `dir`
    ///
    /// Directories, regular files and symlinks only. Files are queued only
    /// if the caller listens for `CREATE`; directories also whenever the
    /// watch is recursive, because the reader installs their watches.
    fn queue_children(
        &mut self,
        wd: WatchDescriptor,
        dir: &Path,
        recursive: bool,
    ) -> Result<(), WatchError> {
        let wants_create = self.mask.contains(EventMask::CREATE);

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.log.log(
                        Level::WARN,
                        format_args!("cannot list {}: {}", dir.display(), err),
                    );
                    continue;
                }
            };

            let file_type = entry.file_type();
            if !(file_type.is_dir() || file_type.is_file() || file_type.is_symlink()) {
                continue;
            }

            let is_dir = file_type.is_dir();
            if wants_create || (is_dir && recursive) {
                let event = Event::created(wd, entry.file_name().to_os_string(), is_dir);
                if let Err(err) = self.pending.push(event) {
                    return Err(self.fatal(err));
                }
            }
        }
        Ok(())
    }

    fn unwatchable(&self, path: &Path, errno: Errno) -> WatchError {
        self.log.log(
            Level::WARN,
            format_args!("cannot watch {:?}: {}", path, errno),
        );
        WatchError::Unwatchable {
            path: path.to_path_buf(),
            errno,
        }
    }
}
