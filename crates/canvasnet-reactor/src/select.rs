use std::collections::BTreeSet;
use std::fmt;
use std::mem::MaybeUninit;

use tracing::{debug, trace};

use crate::error::{wait_failure, Result};
use crate::event::{Descriptor, Event, EventMask, WaitTimeout};
use crate::registry::{Registry, Snapshot};
use crate::traits::{Backend, Multiplexer};

/// One of the three `select(2)` descriptor sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
    Error,
}

impl Direction {
    const ALL: [Direction; 3] = [Direction::Read, Direction::Write, Direction::Error];

    fn mask(self) -> EventMask {
        match self {
            Direction::Read => EventMask::READ,
            Direction::Write => EventMask::WRITE,
            Direction::Error => EventMask::ERROR,
        }
    }
}

/// `select(2)` backend.
///
/// Keeps one master `fd_set` per direction and copies them before every wait,
/// since `select` overwrites its arguments with the ready subset. The ordered
/// per-direction sets track the highest interested descriptor, which bounds
/// `nfds`. Descriptors must be below `FD_SETSIZE`.
pub struct SelectMultiplexer {
    registry: Registry,
    master: [libc::fd_set; 3],
    interested: [BTreeSet<Descriptor>; 3],
    timeout: WaitTimeout,
    snapshot: Snapshot,
}

impl SelectMultiplexer {
    pub fn new() -> Self {
        Self {
            registry: Registry::default(),
            master: [empty_fd_set(), empty_fd_set(), empty_fd_set()],
            interested: Default::default(),
            timeout: WaitTimeout::default(),
            snapshot: Snapshot::default(),
        }
    }

    /// Highest descriptor with interest in `direction`, if any.
    pub fn highest(&self, direction: Direction) -> Option<Descriptor> {
        self.interested[direction as usize].last().copied()
    }

    fn nfds(&self) -> libc::c_int {
        Direction::ALL
            .iter()
            .filter_map(|direction| self.highest(*direction))
            .max()
            .map_or(0, |fd| fd + 1)
    }

    fn apply_interest(&mut self, fd: Descriptor, interest: EventMask) {
        for direction in Direction::ALL {
            let idx = direction as usize;
            let set = &mut self.master[idx];
            if interest.contains(direction.mask()) {
                // SAFETY: `fd` was checked against FD_SETSIZE on registration and
                // `set` is an initialized fd_set owned by this multiplexer.
                unsafe { libc::FD_SET(fd, set) };
                self.interested[idx].insert(fd);
            } else {
                // SAFETY: as above.
                unsafe { libc::FD_CLR(fd, set) };
                self.interested[idx].remove(&fd);
            }
        }
    }
}

impl Default for SelectMultiplexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Multiplexer for SelectMultiplexer {
    fn backend(&self) -> Backend {
        Backend::Select
    }

    fn add(&mut self, fd: Descriptor, interest: EventMask) -> Result<()> {
        self.registry.insert(fd, interest);
        assert!(
            (fd as usize) < libc::FD_SETSIZE,
            "descriptor {fd} exceeds FD_SETSIZE ({})",
            libc::FD_SETSIZE
        );
        self.apply_interest(fd, interest);
        debug!(fd, ?interest, "select: add");
        Ok(())
    }

    fn modify(&mut self, fd: Descriptor, interest: EventMask) -> Result<()> {
        if interest.is_empty() {
            return self.remove(fd);
        }
        self.registry.update(fd, interest);
        self.apply_interest(fd, interest);
        trace!(fd, ?interest, "select: modify");
        Ok(())
    }

    fn remove(&mut self, fd: Descriptor) -> Result<()> {
        self.registry.delete(fd);
        self.apply_interest(fd, EventMask::NONE);
        self.snapshot.discard(fd);
        debug!(fd, "select: remove");
        Ok(())
    }

    fn wait(&mut self) -> Result<usize> {
        let [mut read, mut write, mut error] = self.master;
        let mut timeout = self.timeout.as_timeval();

        // SAFETY: all three sets are initialized copies owned by this frame and
        // `nfds` bounds only descriptors that were validated on registration.
        let rc = unsafe {
            libc::select(self.nfds(), &mut read, &mut write, &mut error, &mut timeout)
        };

        if rc < 0 {
            self.snapshot.clear();
            return wait_failure("select", std::io::Error::last_os_error());
        }
        if rc == 0 {
            self.snapshot.clear();
            return Ok(0);
        }

        let events = self
            .registry
            .iter()
            .filter_map(|entry| {
                let mut mask = EventMask::NONE;
                if is_set(entry.fd, &read) {
                    mask |= EventMask::READ;
                }
                if is_set(entry.fd, &write) {
                    mask |= EventMask::WRITE;
                }
                if is_set(entry.fd, &error) {
                    mask |= EventMask::ERROR;
                }
                let mask = mask & entry.interest;
                (!mask.is_empty()).then_some(Event { fd: entry.fd, mask })
            })
            .collect();

        let ready = self.snapshot.load(events);
        trace!(ready, "select: wait");
        Ok(ready)
    }

    fn next_event(&mut self) -> Option<Event> {
        self.snapshot.next(self.registry.len())
    }

    fn set_timeout(&mut self, timeout: WaitTimeout) {
        debug!(?timeout, "select: timeout");
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

impl fmt::Debug for SelectMultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectMultiplexer")
            .field("registered", &self.registry.len())
            .field("nfds", &self.nfds())
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn empty_fd_set() -> libc::fd_set {
    let mut set = MaybeUninit::<libc::fd_set>::uninit();
    // SAFETY: FD_ZERO fully initializes the set it is given.
    unsafe {
        libc::FD_ZERO(set.as_mut_ptr());
        set.assume_init()
    }
}

fn is_set(fd: Descriptor, set: &libc::fd_set) -> bool {
    // SAFETY: `fd` is a registered descriptor below FD_SETSIZE.
    unsafe { libc::FD_ISSET(fd, set) }
}
