use std::fmt;

use tracing::{debug, trace};

use crate::error::{wait_failure, Result};
use crate::event::{Descriptor, Event, EventMask, WaitTimeout};
use crate::registry::{Registry, Snapshot};
use crate::traits::{Backend, Multiplexer};

/// `poll(2)` backend.
///
/// The `pollfd` array is rebuilt from the registry before every wait, in
/// registration order, so `revents` lines up with the registry and the kernel
/// never sees the live interest state. No descriptor upper bound applies.
pub struct PollMultiplexer {
    registry: Registry,
    pollfds: Vec<libc::pollfd>,
    timeout: WaitTimeout,
    snapshot: Snapshot,
}

impl PollMultiplexer {
    pub fn new() -> Self {
        Self {
            registry: Registry::default(),
            pollfds: Vec::new(),
            timeout: WaitTimeout::default(),
            snapshot: Snapshot::default(),
        }
    }
}

impl Default for PollMultiplexer {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn to_poll_events(interest: EventMask) -> libc::c_short {
    let mut events = 0;
    if interest.is_readable() {
        events |= libc::POLLIN;
    }
    if interest.is_writable() {
        events |= libc::POLLOUT;
    }
    if interest.is_error() {
        events |= libc::POLLPRI;
    }
    events
}

/// Translate `revents` into the mask `select(2)` would have reported.
///
/// Hang-up reads as readable (the next read returns EOF) and a pending socket
/// error reads as readable and writable (the next call returns the error).
pub(crate) fn from_poll_events(fd: Descriptor, revents: libc::c_short) -> EventMask {
    assert!(
        revents & libc::POLLNVAL == 0,
        "descriptor {fd} was closed while still registered"
    );
    let mut mask = EventMask::NONE;
    if revents & (libc::POLLIN | libc::POLLHUP) != 0 {
        mask |= EventMask::READ;
    }
    if revents & libc::POLLOUT != 0 {
        mask |= EventMask::WRITE;
    }
    if revents & libc::POLLPRI != 0 {
        mask |= EventMask::ERROR;
    }
    if revents & libc::POLLERR != 0 {
        mask |= EventMask::READ | EventMask::WRITE;
    }
    mask
}

impl Multiplexer for PollMultiplexer {
    fn backend(&self) -> Backend {
        Backend::Poll
    }

    fn add(&mut self, fd: Descriptor, interest: EventMask) -> Result<()> {
        self.registry.insert(fd, interest);
        debug!(fd, ?interest, "poll: add");
        Ok(())
    }

    fn modify(&mut self, fd: Descriptor, interest: EventMask) -> Result<()> {
        if interest.is_empty() {
            return self.remove(fd);
        }
        self.registry.update(fd, interest);
        trace!(fd, ?interest, "poll: modify");
        Ok(())
    }

    fn remove(&mut self, fd: Descriptor) -> Result<()> {
        self.registry.delete(fd);
        self.snapshot.discard(fd);
        debug!(fd, "poll: remove");
        Ok(())
    }

    fn wait(&mut self) -> Result<usize> {
        self.pollfds.clear();
        self.pollfds
            .extend(self.registry.iter().map(|entry| libc::pollfd {
                fd: entry.fd,
                events: to_poll_events(entry.interest),
                revents: 0,
            }));

        // SAFETY: `pollfds` is a live, initialized buffer of exactly `len` entries.
        let rc = unsafe {
            libc::poll(
                self.pollfds.as_mut_ptr(),
                self.pollfds.len() as libc::nfds_t,
                self.timeout.as_poll_millis(),
            )
        };

        if rc < 0 {
            self.snapshot.clear();
            return wait_failure("poll", std::io::Error::last_os_error());
        }
        if rc == 0 {
            self.snapshot.clear();
            return Ok(0);
        }

        let events = self
            .registry
            .iter()
            .zip(self.pollfds.iter())
            .filter_map(|(entry, pollfd)| {
                let mask = from_poll_events(entry.fd, pollfd.revents) & entry.interest;
                (!mask.is_empty()).then_some(Event { fd: entry.fd, mask })
            })
            .collect();

        let ready = self.snapshot.load(events);
        trace!(ready, "poll: wait");
        Ok(ready)
    }

    fn next_event(&mut self) -> Option<Event> {
        self.snapshot.next(self.registry.len())
    }

    fn set_timeout(&mut self, timeout: WaitTimeout) {
        debug!(?timeout, "poll: timeout");
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

impl fmt::Debug for PollMultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollMultiplexer")
            .field("registered", &self.registry.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interest_maps_to_poll_bits() {
        assert_eq!(to_poll_events(EventMask::READ), libc::POLLIN);
        assert_eq!(
            to_poll_events(EventMask::READ | EventMask::WRITE),
            libc::POLLIN | libc::POLLOUT
        );
        assert_eq!(to_poll_events(EventMask::ERROR), libc::POLLPRI);
    }

    #[test]
    fn hangup_reads_as_readable() {
        assert_eq!(from_poll_events(3, libc::POLLHUP), EventMask::READ);
    }

    #[test]
    fn socket_error_reads_as_readable_and_writable() {
        assert_eq!(
            from_poll_events(3, libc::POLLERR),
            EventMask::READ | EventMask::WRITE
        );
    }

    #[test]
    #[should_panic(expected = "closed while still registered")]
    fn closed_descriptor_panics() {
        from_poll_events(3, libc::POLLNVAL);
    }

    #[test]
    fn empty_registry_waits_out_the_timeout() {
        let mut mux = PollMultiplexer::new();
        mux.set_timeout(WaitTimeout::from_millis(5));
        assert_eq!(mux.wait().unwrap(), 0);
    }
}
