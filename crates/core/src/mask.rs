//! Event mask flags
//!
//! Bit values are the Linux inotify ABI, so a mask can be handed to the
//! kernel as-is and records read back from it decode without translation.

use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

bitflags! {
    /// Set of inotify event bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct EventMask: u32 {
        /// File was accessed
        const ACCESS = 0x0000_0001;
        /// File was modified
        const MODIFY = 0x0000_0002;
        /// Metadata changed
        const ATTRIB = 0x0000_0004;
        /// Writable file was closed
        const CLOSE_WRITE = 0x0000_0008;
        /// Unwritable file was closed
        const CLOSE_NOWRITE = 0x0000_0010;
        /// File was opened
        const OPEN = 0x0000_0020;
        /// File was moved out of the watched directory
        const MOVED_FROM = 0x0000_0040;
        /// File was moved into the watched directory
        const MOVED_TO = 0x0000_0080;
        /// Child was created
        const CREATE = 0x0000_0100;
        /// Child was deleted
        const DELETE = 0x0000_0200;
        /// Watched directory itself was deleted
        const DELETE_SELF = 0x0000_0400;
        /// Watched directory itself was moved
        const MOVE_SELF = 0x0000_0800;

        /// Backing filesystem was unmounted
        const UNMOUNT = 0x0000_2000;
        /// Kernel event queue overflowed
        const Q_OVERFLOW = 0x0000_4000;
        /// Watch was removed
        const IGNORED = 0x0000_8000;

        /// Only watch the path if it is a directory
        const ONLYDIR = 0x0100_0000;
        /// Do not follow a symlink
        const DONT_FOLLOW = 0x0200_0000;
        /// Exclude events on unlinked objects
        const EXCL_UNLINK = 0x0400_0000;
        /// Add to the mask of an existing watch
        const MASK_ADD = 0x2000_0000;
        /// Subject of the event is a directory
        const ISDIR = 0x4000_0000;
        /// Only send the event once
        const ONESHOT = 0x8000_0000;

        /// Both move directions
        const MOVE = Self::MOVED_FROM.bits() | Self::MOVED_TO.bits();
        /// Both close variants
        const CLOSE = Self::CLOSE_WRITE.bits() | Self::CLOSE_NOWRITE.bits();
        /// Every event a watch can subscribe to
        const ALL_EVENTS = Self::ACCESS.bits()
            | Self::MODIFY.bits()
            | Self::ATTRIB.bits()
            | Self::CLOSE_WRITE.bits()
            | Self::CLOSE_NOWRITE.bits()
            | Self::OPEN.bits()
            | Self::MOVED_FROM.bits()
            | Self::MOVED_TO.bits()
            | Self::CREATE.bits()
            | Self::DELETE.bits()
            | Self::DELETE_SELF.bits()
            | Self::MOVE_SELF.bits();
    }
}

/// Unknown event name in a mask list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event name: {0:?}")]
pub struct ParseMaskError(pub String);

impl EventMask {
    /// Parse a list of event names (`"create"`, `"moved_to"`, `"all_events"`, ...)
    pub fn from_names<I, S>(names: I) -> Result<Self, ParseMaskError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mask = EventMask::empty();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            let flag = EventMask::from_name(&name.to_ascii_uppercase())
                .ok_or_else(|| ParseMaskError(name.to_string()))?;
            mask |= flag;
        }
        Ok(mask)
    }
}

/// Parses a comma or `|` separated list of event names
impl FromStr for EventMask {
    type Err = ParseMaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventMask::from_names(s.split([',', '|']))
    }
}

/// Renders as `create|isdir`, with any unnamed bits in hex
impl fmt::Display for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("0");
        }

        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str("|")?;
            }
            first = false;
            f.write_str(&name.to_ascii_lowercase())?;
        }

        let unknown = self.bits() & !EventMask::all().bits();
        if unknown != 0 {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{:#x}", unknown)?;
        }
        Ok(())
    }
}
