//! Watch table: descriptor -> watched directory

use ahash::AHashMap;
use std::path::{Path, PathBuf};
use treewatch_core::{path, WatchDescriptor};

/// One watched directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watch {
    /// Last known path; a trailing `/` marks a shallow watch
    pub path: PathBuf,
    /// Set when the descriptor was just reconciled as moved in; the next
    /// MOVE_SELF for it clears the flag instead of removing the watch
    pub in_move: bool,
}

impl Watch {
    /// Whether subdirectories get their own watches
    pub fn is_recursive(&self) -> bool {
        !path::is_shallow(&self.path)
    }
}

/// Authoritative map of active watches
///
/// Entries are removed only when the kernel confirms the watch is gone.
#[derive(Debug, Default)]
pub struct WatchTable {
    watches: AHashMap<WatchDescriptor, Watch>,
}

impl WatchTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a watch
    pub fn get(&self, wd: WatchDescriptor) -> Option<&Watch> {
        self.watches.get(&wd)
    }

    /// Look up a watch for update
    pub fn get_mut(&mut self, wd: WatchDescriptor) -> Option<&mut Watch> {
        self.watches.get_mut(&wd)
    }

    /// Path watched by `wd`
    pub fn path(&self, wd: WatchDescriptor) -> Option<&Path> {
        self.watches.get(&wd).map(|watch| watch.path.as_path())
    }

    /// Whether `wd` is known
    pub fn contains(&self, wd: WatchDescriptor) -> bool {
        self.watches.contains_key(&wd)
    }

    /// Record a new watch
    pub fn insert(&mut self, wd: WatchDescriptor, path: PathBuf) {
        self.watches.insert(wd, Watch { path, in_move: false });
    }

    /// Update the path of an existing watch, returning the old one
    pub fn set_path(&mut self, wd: WatchDescriptor, path: PathBuf) -> Option<PathBuf> {
        self.watches
            .get_mut(&wd)
            .map(|watch| std::mem::replace(&mut watch.path, path))
    }

    /// Forget a watch
    pub fn remove(&mut self, wd: WatchDescriptor) -> Option<Watch> {
        self.watches.remove(&wd)
    }

    /// Descriptors whose path is `prefix` or lies below it
    pub fn descendants<'a>(
        &'a self,
        prefix: &'a Path,
    ) -> impl Iterator<Item = WatchDescriptor> + 'a {
        self.watches
            .iter()
            .filter(move |(_, watch)| path::is_descendant(&watch.path, prefix))
            .map(|(&wd, _)| wd)
    }

    /// All descriptors
    pub fn descriptors(&self) -> impl Iterator<Item = WatchDescriptor> + '_ {
        self.watches.keys().copied()
    }

    /// All entries
    pub fn iter(&self) -> impl Iterator<Item = (WatchDescriptor, &Watch)> {
        self.watches.iter().map(|(&wd, watch)| (wd, watch))
    }

    /// Number of watches
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }
}
