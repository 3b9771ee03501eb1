use std::collections::HashMap;
use std::fmt;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use tracing::{debug, trace};

use crate::error::{wait_failure, ReactorError, Result};
use crate::event::{Descriptor, Event, EventMask, WaitTimeout};
use crate::registry::{Registry, Snapshot};
use crate::traits::{Backend, Multiplexer};

/// `epoll(7)` backend (Linux).
///
/// The kernel keeps the interest list, so registration changes are system
/// calls. Ready descriptors come back in arrival order and are re-sorted into
/// registration order before they are yielded.
pub struct EpollMultiplexer {
    epfd: OwnedFd,
    registry: Registry,
    buffer: Vec<libc::epoll_event>,
    timeout: WaitTimeout,
    snapshot: Snapshot,
}

impl EpollMultiplexer {
    pub fn new() -> Result<Self> {
        // SAFETY: plain syscall; the returned descriptor is checked before use.
        let raw = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if raw < 0 {
            return Err(ReactorError::Open(std::io::Error::last_os_error()));
        }
        // SAFETY: `raw` is a freshly created descriptor owned by nobody else.
        let epfd = unsafe { OwnedFd::from_raw_fd(raw) };
        debug!(epfd = raw, "epoll: created");

        Ok(Self {
            epfd,
            registry: Registry::default(),
            buffer: Vec::new(),
            timeout: WaitTimeout::default(),
            snapshot: Snapshot::default(),
        })
    }

    fn ctl(&self, op: libc::c_int, fd: Descriptor, interest: EventMask) -> std::io::Result<()> {
        let mut event = libc::epoll_event {
            events: to_epoll_events(interest),
            u64: fd as u64,
        };
        // SAFETY: `event` is a valid epoll_event for the duration of the call.
        let rc = unsafe { libc::epoll_ctl(self.epfd.as_raw_fd(), op, fd, &mut event) };
        if rc < 0 {
            Err(std::io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

fn to_epoll_events(interest: EventMask) -> u32 {
    let mut events = 0u32;
    if interest.is_readable() {
        events |= (libc::EPOLLIN | libc::EPOLLRDHUP) as u32;
    }
    if interest.is_writable() {
        events |= libc::EPOLLOUT as u32;
    }
    if interest.is_error() {
        events |= libc::EPOLLPRI as u32;
    }
    events
}

/// Same translation as the poll backend: hang-up is readable, a socket error
/// is readable and writable.
fn from_epoll_events(events: u32) -> EventMask {
    let mut mask = EventMask::NONE;
    if events & (libc::EPOLLIN | libc::EPOLLHUP | libc::EPOLLRDHUP) as u32 != 0 {
        mask |= EventMask::READ;
    }
    if events & libc::EPOLLOUT as u32 != 0 {
        mask |= EventMask::WRITE;
    }
    if events & libc::EPOLLPRI as u32 != 0 {
        mask |= EventMask::ERROR;
    }
    if events & libc::EPOLLERR as u32 != 0 {
        mask |= EventMask::READ | EventMask::WRITE;
    }
    mask
}

impl Multiplexer for EpollMultiplexer {
    fn backend(&self) -> Backend {
        Backend::Epoll
    }

    fn add(&mut self, fd: Descriptor, interest: EventMask) -> Result<()> {
        self.registry.insert(fd, interest);
        if let Err(source) = self.ctl(libc::EPOLL_CTL_ADD, fd, interest) {
            self.registry.delete(fd);
            return Err(ReactorError::Register { fd, source });
        }
        debug!(fd, ?interest, "epoll: add");
        Ok(())
    }

    fn modify(&mut self, fd: Descriptor, interest: EventMask) -> Result<()> {
        if interest.is_empty() {
            return self.remove(fd);
        }
        let previous = self.registry.update(fd, interest);
        if let Err(source) = self.ctl(libc::EPOLL_CTL_MOD, fd, interest) {
            self.registry.update(fd, previous);
            return Err(ReactorError::Register { fd, source });
        }
        trace!(fd, ?interest, "epoll: modify");
        Ok(())
    }

    fn remove(&mut self, fd: Descriptor) -> Result<()> {
        self.registry.delete(fd);
        self.snapshot.discard(fd);
        match self.ctl(libc::EPOLL_CTL_DEL, fd, EventMask::NONE) {
            Ok(()) => {}
            // Closing the last copy of a descriptor drops it from the kernel list.
            Err(err)
                if matches!(err.raw_os_error(), Some(libc::EBADF) | Some(libc::ENOENT)) =>
            {
                debug!(fd, error = %err, "epoll: descriptor already gone");
            }
            Err(source) => return Err(ReactorError::Register { fd, source }),
        }
        debug!(fd, "epoll: remove");
        Ok(())
    }

    fn wait(&mut self) -> Result<usize> {
        let capacity = self.registry.len().max(1);
        self.buffer.clear();
        self.buffer
            .resize(capacity, libc::epoll_event { events: 0, u64: 0 });

        // SAFETY: `buffer` holds `capacity` initialized entries for the kernel to fill.
        let rc = unsafe {
            libc::epoll_wait(
                self.epfd.as_raw_fd(),
                self.buffer.as_mut_ptr(),
                capacity.min(libc::c_int::MAX as usize) as libc::c_int,
                self.timeout.as_poll_millis(),
            )
        };

        if rc < 0 {
            self.snapshot.clear();
            return wait_failure("epoll", std::io::Error::last_os_error());
        }
        if rc == 0 {
            self.snapshot.clear();
            return Ok(0);
        }

        let ready: HashMap<Descriptor, EventMask> = self.buffer[..rc as usize]
            .iter()
            .map(|event| {
                let (data, bits) = (event.u64, event.events);
                (data as Descriptor, from_epoll_events(bits))
            })
            .collect();

        let events = self
            .registry
            .iter()
            .filter_map(|entry| {
                let mask = ready.get(&entry.fd).copied()? & entry.interest;
                (!mask.is_empty()).then_some(Event { fd: entry.fd, mask })
            })
            .collect();

        let ready = self.snapshot.load(events);
        trace!(ready, "epoll: wait");
        Ok(ready)
    }

    fn next_event(&mut self) -> Option<Event> {
        self.snapshot.next(self.registry.len())
    }

    fn set_timeout(&mut self, timeout: WaitTimeout) {
        debug!(?timeout, "epoll: timeout");
        self.timeout = timeout;
    }

    fn timeout(&self) -> WaitTimeout {
        self.timeout
    }

    fn interest(&self, fd: Descriptor) -> Option<EventMask> {
        self.registry.interest(fd)
    }

    fn len(&self) -> usize {
        self.registry.len()
    }
}

impl fmt::Debug for EpollMultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpollMultiplexer")
            .field("epfd", &self.epfd.as_raw_fd())
            .field("registered", &self.registry.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}
