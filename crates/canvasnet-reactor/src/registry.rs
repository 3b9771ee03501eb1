//! Bookkeeping shared by every backend: the ordered interest registry and
//! the snapshot of the last wait.

use crate::event::{Descriptor, Event, EventMask, INVALID_DESCRIPTOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Registration {
    pub fd: Descriptor,
    pub interest: EventMask,
}

/// Registered descriptors in insertion order.
///
/// Invariant: at most one entry per descriptor and no entry with an empty
/// interest mask.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: Vec<Registration>,
}

impl Registry {
    pub fn insert(&mut self, fd: Descriptor, interest: EventMask) {
        assert!(fd != INVALID_DESCRIPTOR, "cannot register the invalid descriptor");
        assert!(
            !interest.is_empty(),
            "descriptor {fd} registered with an empty interest mask"
        );
        assert!(
            self.position(fd).is_none(),
            "descriptor {fd} is already registered"
        );
        self.entries.push(Registration { fd, interest });
    }

    /// Replace the interest of a registered descriptor, returning the old mask.
    pub fn update(&mut self, fd: Descriptor, interest: EventMask) -> EventMask {
        assert!(!interest.is_empty(), "empty interest must go through delete");
        let idx = self.expect_position(fd);
        std::mem::replace(&mut self.entries[idx].interest, interest)
    }

    /// Remove a registered descriptor, returning its last interest.
    pub fn delete(&mut self, fd: Descriptor) -> EventMask {
        let idx = self.expect_position(fd);
        self.entries.remove(idx).interest
    }

    pub fn interest(&self, fd: Descriptor) -> Option<EventMask> {
        self.position(fd).map(|idx| self.entries[idx].interest)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn position(&self, fd: Descriptor) -> Option<usize> {
        self.entries.iter().position(|entry| entry.fd == fd)
    }

    fn expect_position(&self, fd: Descriptor) -> usize {
        assert!(fd != INVALID_DESCRIPTOR, "the invalid descriptor is never registered");
        match self.position(fd) {
            Some(idx) => idx,
            None => panic!("descriptor {fd} is not registered"),
        }
    }
}

/// Ready descriptors captured by the last wait, with the iteration cursor.
#[derive(Debug, Default)]
pub(crate) struct Snapshot {
    events: Vec<Event>,
    cursor: Option<usize>,
}

impl Snapshot {
    /// Replace the snapshot with the results of a completed wait.
    ///
    /// `events` must already be in registry order with empty masks skipped.
    /// Returns the ready count. A zero count leaves the cursor unset.
    pub fn load(&mut self, events: Vec<Event>) -> usize {
        debug_assert!(events.iter().all(|event| !event.mask.is_empty()));
        self.cursor = if events.is_empty() { None } else { Some(0) };
        self.events = events;
        self.events.len()
    }

    /// Invalidate the snapshot (zero-ready or failed wait).
    pub fn clear(&mut self) {
        self.events.clear();
        self.cursor = None;
    }

    pub fn next(&mut self, registered: usize) -> Option<Event> {
        assert!(registered > 0, "next_event called with no registered descriptors");
        let cursor = match self.cursor.as_mut() {
            Some(cursor) => cursor,
            None => panic!("next_event called without a wait that reported ready descriptors"),
        };
        let event = self.events.get(*cursor).copied()?;
        *cursor += 1;
        Some(event)
    }

    /// Drop a descriptor from the part of the snapshot not yet yielded.
    pub fn discard(&mut self, fd: Descriptor) {
        let start = self.cursor.unwrap_or(0).min(self.events.len());
        let mut idx = start;
        while idx < self.events.len() {
            if self.events[idx].fd == fd {
                self.events.remove(idx);
            } else {
                idx += 1;
            }
        }
    }
}
