//! Treewatch Core - primitives shared by the watch engine
//!
//! This crate provides:
//! - Event mask flags with inotify bit values
//! - Watch descriptors
//! - The binary event record codec (`struct inotify_event` framing)
//! - Path helpers for the trailing-slash watch-depth convention

pub mod mask;
pub mod path;
pub mod record;

// Re-export main types for convenience
pub use mask::{EventMask, ParseMaskError};
pub use record::{Event, RecordError, RecordReader, WatchDescriptor};
