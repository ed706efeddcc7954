//! Recursive directory watching on top of inotify
//!
//! inotify only watches single directories. This crate keeps a watch on
//! every directory of a live subtree:
//! - Watches are added as subdirectories are created or moved in
//! - Watches are torn down recursively as directories move out
//! - Children that appeared before their parent's watch kicked in are
//!   reported through synthesized `CREATE` events, so none is missed
//!
//! A path ending in `/` is watched shallowly (immediate children only);
//! any other path is watched recursively.
//!
//! ```no_run
//! use watcher::{Watcher, WatcherConfig};
//! use std::time::Duration;
//!
//! let mut watcher = Watcher::new(WatcherConfig::default())?;
//! watcher.add_watch("/home/user1", true)?;   // "/home/user1/**/"
//! watcher.add_watch("/home/user2/", true)?;  // "/home/user2/*/"
//! while let Some(event) = watcher.read(Some(Duration::from_secs(5)), Duration::ZERO)? {
//!     println!("{}: {:?}", watcher.event_path(&event)?.display(), event.mask);
//! }
//! # Ok::<(), watcher::WatchError>(())
//! ```

pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod log;
pub mod platform;
pub mod table;

mod install;
mod reader;

#[cfg(test)]
mod testing;

// Re-exports
pub use buffer::EventBuffer;
pub use config::WatcherConfig;
pub use engine::Watcher;
pub use error::WatchError;
pub use log::{Log, TracingLog};
pub use platform::Backend;
pub use table::{Watch, WatchTable};
pub use treewatch_core::{Event, EventMask, WatchDescriptor};

#[cfg(target_os = "linux")]
pub use platform::linux::Inotify;

/// Result type for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;
