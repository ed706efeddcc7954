//! Scripted backend for engine tests
//!
//! Registers watches against the real filesystem (so `ONLYDIR` failures
//! behave) but hands out descriptors by path and only delivers the events
//! a test pushes.

use crate::config::WatcherConfig;
use crate::engine::Watcher;
use crate::log::Log;
use crate::platform::Backend;
use nix::errno::Errno;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tracing::Level;
use treewatch_core::{Event, EventMask, WatchDescriptor};

#[derive(Debug, Default)]
pub(crate) struct ScriptedBackend {
    next_wd: i32,
    by_path: HashMap<OsString, WatchDescriptor>,
    masks: HashMap<WatchDescriptor, EventMask>,
    queue: Vec<u8>,
    /// Descriptors passed to `rm_watch`, in order
    pub removed: Vec<WatchDescriptor>,
    /// Next read returns zero bytes
    pub eof: bool,
    /// Time spent in `wait_readable` with nothing queued
    pub waited: Duration,
}

/// Watch key: the path without its trailing slashes, as the kernel sees it
fn key(path: &Path) -> OsString {
    let bytes = path.as_os_str().as_bytes();
    let end = bytes.iter().rposition(|&b| b != b'/').map_or(1, |i| i + 1);
    OsStr::from_bytes(&bytes[..end.min(bytes.len())]).to_os_string()
}

impl ScriptedBackend {
    /// Queue a kernel event
    pub fn push(&mut self, event: Event) {
        event.encode_into(&mut self.queue);
    }

    /// Queue an event on `wd` about child `name`
    pub fn push_child(&mut self, wd: WatchDescriptor, mask: EventMask, name: &str) {
        self.push(Event {
            wd,
            mask,
            cookie: 0,
            name: Some(OsString::from(name)),
        });
    }

    /// Queue an event about the watched directory itself
    pub fn push_self(&mut self, wd: WatchDescriptor, mask: EventMask) {
        self.push(Event {
            wd,
            mask,
            cookie: 0,
            name: None,
        });
    }

    /// Queue raw bytes
    pub fn push_raw(&mut self, bytes: &[u8]) {
        self.queue.extend_from_slice(bytes);
    }

    /// Follow a rename: the watch keeps its descriptor under the new path
    pub fn rename(&mut self, from: &Path, to: &Path) {
        let from = key(from);
        let to = key(to);
        let moved: Vec<_> = self
            .by_path
            .keys()
            .filter(|path| {
                let path = path.as_bytes();
                path.starts_with(from.as_bytes())
                    && (path.len() == from.len() || path[from.len()] == b'/')
            })
            .cloned()
            .collect();

        for old in moved {
            let wd = self.by_path.remove(&old).unwrap();
            let mut new = to.clone();
            new.push(OsStr::from_bytes(&old.as_bytes()[from.len()..]));
            self.by_path.insert(new, wd);
        }
    }

    /// Descriptor registered for `path`
    pub fn wd_of(&self, path: &Path) -> Option<WatchDescriptor> {
        self.by_path.get(&key(path)).copied()
    }

    /// Mask last registered for `wd`
    pub fn mask_of(&self, wd: WatchDescriptor) -> Option<EventMask> {
        self.masks.get(&wd).copied()
    }
}

impl Backend for ScriptedBackend {
    fn add_watch(&mut self, path: &Path, mask: EventMask) -> Result<WatchDescriptor, Errno> {
        let metadata = std::fs::metadata(path).map_err(|_| Errno::ENOENT)?;
        if mask.contains(EventMask::ONLYDIR) && !metadata.is_dir() {
            return Err(Errno::ENOTDIR);
        }

        let wd = match self.by_path.get(&key(path)) {
            Some(&wd) => wd,
            None => {
                self.next_wd += 1;
                let wd = WatchDescriptor::new(self.next_wd);
                self.by_path.insert(key(path), wd);
                wd
            }
        };
        self.masks.insert(wd, mask);
        Ok(wd)
    }

    fn rm_watch(&mut self, wd: WatchDescriptor) -> Result<(), Errno> {
        if self.masks.remove(&wd).is_none() {
            return Err(Errno::EINVAL);
        }
        self.by_path.retain(|_, known| *known != wd);
        self.removed.push(wd);
        self.push_self(wd, EventMask::IGNORED);
        Ok(())
    }

    fn wait_readable(&mut self, timeout: Option<Duration>) -> Result<bool, Errno> {
        if !self.queue.is_empty() || self.eof {
            return Ok(true);
        }
        let timeout = timeout.expect("scripted backend would block forever");
        std::thread::sleep(timeout);
        self.waited += timeout;
        Ok(false)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, Errno> {
        if self.eof {
            return Ok(0);
        }
        let n = buf.len().min(self.queue.len());
        buf[..n].copy_from_slice(&self.queue[..n]);
        self.queue.drain(..n);
        Ok(n)
    }
}

/// Drops every message
struct Discard;

impl Log for Discard {
    fn log(&self, _: Level, _: fmt::Arguments<'_>) {}
}

/// Keeps `LEVEL: message` lines
struct Recorder(Rc<RefCell<Vec<String>>>);

impl Log for Recorder {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        self.0.borrow_mut().push(format!("{level}: {args}"));
    }
}

/// Watcher over a scripted backend that drops log output
pub(crate) fn scripted_watcher(config: WatcherConfig) -> Watcher<ScriptedBackend> {
    Watcher::with_backend(ScriptedBackend::default(), config, Box::new(Discard)).unwrap()
}

/// Watcher over a scripted backend that records its log lines
pub(crate) fn recording_watcher(
    config: WatcherConfig,
) -> (Watcher<ScriptedBackend>, Rc<RefCell<Vec<String>>>) {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let log = Recorder(Rc::clone(&lines));
    let watcher = Watcher::with_backend(ScriptedBackend::default(), config, Box::new(log)).unwrap();
    (watcher, lines)
}
