//! Path helpers
//!
//! Watch paths are compared as raw bytes. A trailing `/` marks a shallow
//! watch, so `Path` component logic (which drops it) is avoided here.

use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

/// Join a directory and a child name without doubling or inventing separators
pub fn join(dir: &Path, name: &OsStr) -> PathBuf {
    let dir = dir.as_os_str().as_bytes();
    let name = name.as_bytes();

    if dir.is_empty() {
        return PathBuf::from(OsStr::from_bytes(name));
    }
    if name.is_empty() {
        return PathBuf::from(OsStr::from_bytes(dir));
    }

    let mut joined = Vec::with_capacity(dir.len() + 1 + name.len());
    joined.extend_from_slice(dir);
    if !dir.ends_with(b"/") {
        joined.push(b'/');
    }
    joined.extend_from_slice(name);
    PathBuf::from(OsString::from_vec(joined))
}

/// Whether `path` names a shallow watch (ends with `/`)
pub fn is_shallow(path: &Path) -> bool {
    path.as_os_str().as_bytes().ends_with(b"/")
}

/// Whether `path` is `prefix` itself or lies below it
pub fn is_descendant(path: &Path, prefix: &Path) -> bool {
    let path = path.as_os_str().as_bytes();
    let prefix = prefix.as_os_str().as_bytes();

    if !path.starts_with(prefix) {
        return false;
    }
    path.len() == prefix.len() || prefix.ends_with(b"/") || path[prefix.len()] == b'/'
}

/// Whether registering `requested` over an existing watch on `stored` changes nothing
///
/// True when the paths are identical, or when `requested` is the shallow
/// spelling of a recursive `stored` path.
pub fn is_same_watch(stored: &Path, requested: &Path) -> bool {
    let stored = stored.as_os_str().as_bytes();
    let requested = requested.as_os_str().as_bytes();

    match requested.strip_prefix(stored) {
        Some(rest) => rest.is_empty() || rest == b"/",
        None => false,
    }
}

/// Whether `requested` only drops the trailing slash of a shallow `stored` path
pub fn is_deepened(stored: &Path, requested: &Path) -> bool {
    let stored = stored.as_os_str().as_bytes();
    let requested = requested.as_os_str().as_bytes();

    stored.strip_prefix(requested) == Some(b"/".as_slice())
}
