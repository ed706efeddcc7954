//! [`Backend`] implementation for linux, based on `inotify`.

use super::Backend;
use nix::errno::Errno;
use std::ffi::CString;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::time::Duration;
use treewatch_core::{EventMask, WatchDescriptor};

/// An inotify instance
///
/// The fd is non-blocking; reads only happen after `poll` reports it readable.
/// Closing it (on drop) releases every watch.
#[derive(Debug)]
pub struct Inotify {
    fd: OwnedFd,
}

impl Inotify {
    /// Create a new inotify instance
    pub fn init() -> Result<Self, Errno> {
        // SAFETY: takes no pointers; the result is checked before use
        let fd = unsafe { libc::inotify_init1(libc::IN_NONBLOCK | libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(Errno::last());
        }

        // SAFETY: fd was just returned by inotify_init1 and is owned by nobody else
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Self { fd })
    }
}

impl Backend for Inotify {
    fn add_watch(&mut self, path: &Path, mask: EventMask) -> Result<WatchDescriptor, Errno> {
        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| Errno::EINVAL)?;
        // SAFETY: c_path is NUL-terminated and outlives the call
        let wd = unsafe {
            libc::inotify_add_watch(self.fd.as_raw_fd(), c_path.as_ptr(), mask.bits())
        };
        if wd < 0 {
            return Err(Errno::last());
        }
        Ok(WatchDescriptor::new(wd))
    }

    fn rm_watch(&mut self, wd: WatchDescriptor) -> Result<(), Errno> {
        // SAFETY: plain integers; the fd stays open while self is borrowed
        let rc = unsafe { libc::inotify_rm_watch(self.fd.as_raw_fd(), wd.get()) };
        if rc < 0 {
            return Err(Errno::last());
        }
        Ok(())
    }

    fn wait_readable(&mut self, timeout: Option<Duration>) -> Result<bool, Errno> {
        let mut pfd = libc::pollfd {
            fd: self.fd.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };

        // SAFETY: pfd is a single valid pollfd, matching nfds = 1
        let rc = unsafe { libc::poll(&mut pfd, 1, poll_timeout(timeout)) };
        match rc {
            -1 => Err(Errno::last()),
            0 => Ok(false),
            _ => Ok(true),
        }
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, Errno> {
        // SAFETY: the kernel writes at most buf.len() bytes into buf
        let n = unsafe { libc::read(self.fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(Errno::last());
        }
        Ok(n as usize)
    }
}

/// `poll(2)` timeout in milliseconds, rounded up so short waits don't spin
fn poll_timeout(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(timeout) => {
            let millis = timeout.as_nanos().div_ceil(1_000_000);
            millis.min(libc::c_int::MAX as u128) as libc::c_int
        }
    }
}
