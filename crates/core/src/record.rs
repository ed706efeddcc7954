//! Binary event records
//!
//! Layout is bit-exact with `struct inotify_event`, in native byte order:
//!
//! ```text
//! wd:     i32
//! mask:   u32
//! cookie: u32
//! len:    u32
//! name:   [u8; len]   NUL-terminated, zero padded
//! ```
//!
//! Records synthesized here pad the name to a `size_of::<i32>()` boundary.
//! The kernel may pad further; the decoder only trusts `len`.

use crate::mask::EventMask;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use thiserror::Error;

/// Size of the fixed record header
pub const HEADER_LEN: usize = 16;

/// Longest file name the kernel will report
pub const NAME_MAX: usize = 255;

/// Largest record the kernel can produce
pub const MAX_RECORD_LEN: usize = HEADER_LEN + NAME_MAX + 1;

const NAME_ALIGN: usize = std::mem::size_of::<i32>();

/// Kernel-assigned watch handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchDescriptor(i32);

impl WatchDescriptor {
    /// Wrap a raw descriptor
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw descriptor value
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for WatchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// One decoded event record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Watch the event was reported on
    pub wd: WatchDescriptor,
    /// Event bits
    pub mask: EventMask,
    /// Correlates MOVED_FROM/MOVED_TO pairs, zero otherwise
    pub cookie: u32,
    /// Child name, `None` when the event is about the watched directory itself
    pub name: Option<OsString>,
}

impl Event {
    /// Synthesized creation of `name` inside the directory watched by `wd`
    pub fn created(wd: WatchDescriptor, name: OsString, is_dir: bool) -> Self {
        let mask = if is_dir {
            EventMask::CREATE | EventMask::ISDIR
        } else {
            EventMask::CREATE
        };

        Self {
            wd,
            mask,
            cookie: 0,
            name: Some(name),
        }
    }

    /// Whether the subject of the event is a directory
    pub fn is_dir(&self) -> bool {
        self.mask.contains(EventMask::ISDIR)
    }

    /// Name as a plain `OsStr`, empty for self events
    pub fn name(&self) -> &OsStr {
        self.name.as_deref().unwrap_or_default()
    }

    /// Value of the `len` header field: name plus NUL, padded
    pub fn name_len(&self) -> usize {
        match &self.name {
            Some(name) => (name.len() + NAME_ALIGN) / NAME_ALIGN * NAME_ALIGN,
            None => 0,
        }
    }

    /// Total framed size of the record
    pub fn framed_len(&self) -> usize {
        HEADER_LEN + self.name_len()
    }

    /// Append the framed record to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let name_len = self.name_len();
        out.reserve(HEADER_LEN + name_len);

        out.extend_from_slice(&self.wd.get().to_ne_bytes());
        out.extend_from_slice(&self.mask.bits().to_ne_bytes());
        out.extend_from_slice(&self.cookie.to_ne_bytes());
        out.extend_from_slice(&(name_len as u32).to_ne_bytes());

        if let Some(name) = &self.name {
            let bytes = name.as_bytes();
            out.extend_from_slice(bytes);
            // NUL terminator plus padding
            out.resize(out.len() + name_len - bytes.len(), 0);
        }
    }

    /// Framed record as a fresh buffer
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.framed_len());
        self.encode_into(&mut out);
        out
    }
}

/// Framing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Record header or payload runs past the end of the buffer
    #[error("incomplete event record at offset {offset}: need {needed} bytes, have {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
}

/// Iterator over the records packed in a byte buffer
///
/// Stops after the first framing error.
pub struct RecordReader<'a> {
    bytes: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> RecordReader<'a> {
    /// Read records from `bytes`
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            failed: false,
        }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for RecordReader<'_> {
    type Item = Result<Event, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.bytes.len() {
            return None;
        }

        let rest = &self.bytes[self.offset..];
        if rest.len() < HEADER_LEN {
            self.failed = true;
            return Some(Err(RecordError::Truncated {
                offset: self.offset,
                needed: HEADER_LEN,
                available: rest.len(),
            }));
        }

        let wd = read_u32(rest, 0) as i32;
        let mask = read_u32(rest, 4);
        let cookie = read_u32(rest, 8);
        let len = read_u32(rest, 12) as usize;

        let needed = HEADER_LEN + len;
        if rest.len() < needed {
            self.failed = true;
            return Some(Err(RecordError::Truncated {
                offset: self.offset,
                needed,
                available: rest.len(),
            }));
        }

        let payload = &rest[HEADER_LEN..needed];
        let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
        let name = (end > 0).then(|| OsString::from_vec(payload[..end].to_vec()));

        self.offset += needed;
        Some(Ok(Event {
            wd: WatchDescriptor::new(wd),
            mask: EventMask::from_bits_retain(mask),
            cookie,
            name,
        }))
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_ne_bytes(word)
}
