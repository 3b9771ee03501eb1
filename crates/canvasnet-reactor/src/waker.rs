use std::io::ErrorKind;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use tracing::debug;

use crate::error::{ReactorError, Result};
use crate::event::Descriptor;

/// Self-pipe used to cut a blocking wait short from another thread.
///
/// Register [`Waker::fd`] for `READ`; [`Waker::wake`] makes it readable and
/// [`Waker::drain`] resets it. Both ends are non-blocking and close-on-exec.
#[derive(Debug)]
pub struct Waker {
    read: OwnedFd,
    write: OwnedFd,
}

impl Waker {
    pub fn new() -> Result<Self> {
        let mut fds = [0 as libc::c_int; 2];
        // SAFETY: `fds` has room for the two descriptors pipe(2) writes.
        if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
            return Err(ReactorError::Waker(std::io::Error::last_os_error()));
        }
        // SAFETY: pipe(2) succeeded, so both descriptors are open and unowned.
        let (read, write) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
        for fd in [&read, &write] {
            configure(fd.as_raw_fd()).map_err(ReactorError::Waker)?;
        }
        debug!(read = fds[0], write = fds[1], "waker: created");
        Ok(Self { read, write })
    }

    /// Descriptor to register for `READ`.
    pub fn fd(&self) -> Descriptor {
        self.read.as_raw_fd()
    }

    /// Make the read end readable. A full pipe already counts as woken.
    pub fn wake(&self) -> Result<()> {
        loop {
            // SAFETY: writes one byte from a live stack buffer to an owned descriptor.
            let rc = unsafe { libc::write(self.write.as_raw_fd(), [1u8].as_ptr().cast(), 1) };
            if rc >= 0 {
                return Ok(());
            }
            let err = std::io::Error::last_os_error();
            match err.kind() {
                ErrorKind::Interrupted => continue,
                ErrorKind::WouldBlock => return Ok(()),
                _ => return Err(ReactorError::Waker(err)),
            }
        }
    }

    /// Consume every pending wake-up.
    pub fn drain(&self) -> Result<()> {
        let mut buf = [0u8; 64];
        loop {
            // SAFETY: reads into a live stack buffer of the stated length.
            let rc = unsafe {
                libc::read(self.read.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len())
            };
            if rc > 0 {
                continue;
            }
            if rc == 0 {
                return Ok(());
            }
            let err = std::io::Error::last_os_error();
            match err.kind() {
                ErrorKind::Interrupted => continue,
                ErrorKind::WouldBlock => return Ok(()),
                _ => return Err(ReactorError::Waker(err)),
            }
        }
    }
}

fn configure(fd: Descriptor) -> std::io::Result<()> {
    // SAFETY: fcntl on a descriptor this module owns.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags < 0 || libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
            return Err(std::io::Error::last_os_error());
        }
        let flags = libc::fcntl(fd, libc::F_GETFD);
        if flags < 0 || libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) < 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}
