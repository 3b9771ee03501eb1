use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::time::Duration;

/// Raw descriptor identifying one connection endpoint.
pub type Descriptor = i32;

/// Sentinel that can never be registered.
pub const INVALID_DESCRIPTOR: Descriptor = -1;

/// Bit set of readiness conditions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventMask(u8);

impl EventMask {
    /// No readiness condition.
    pub const NONE: EventMask = EventMask(0);
    /// Data can be read (or the peer hung up).
    pub const READ: EventMask = EventMask(1);
    /// Data can be written without blocking.
    pub const WRITE: EventMask = EventMask(2);
    /// Exceptional condition (out-of-band data, socket error).
    pub const ERROR: EventMask = EventMask(4);
    /// All conditions.
    pub const ALL: EventMask = EventMask(7);

    /// Build a mask from raw bits, ignoring unknown bits.
    pub const fn from_bits(bits: u8) -> Self {
        EventMask(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `other` is set in `self`.
    pub const fn contains(self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if `self` and `other` share at least one bit.
    pub const fn intersects(self, other: EventMask) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_readable(self) -> bool {
        self.intersects(Self::READ)
    }

    pub const fn is_writable(self) -> bool {
        self.intersects(Self::WRITE)
    }

    pub const fn is_error(self) -> bool {
        self.intersects(Self::ERROR)
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: EventMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EventMask {
    type Output = EventMask;

    fn bitand(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 & rhs.0)
    }
}

impl fmt::Debug for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut names = Vec::with_capacity(3);
        if self.is_readable() {
            names.push("READ");
        }
        if self.is_writable() {
            names.push("WRITE");
        }
        if self.is_error() {
            names.push("ERROR");
        }
        f.write_str(&names.join("|"))
    }
}

/// A descriptor together with the interest it satisfied in the last wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub fd: Descriptor,
    pub mask: EventMask,
}

/// Upper bound for one `wait` call, kept at the resolution of `select(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTimeout {
    secs: u64,
    micros: u32,
}

impl WaitTimeout {
    /// Return immediately.
    pub const ZERO: WaitTimeout = WaitTimeout { secs: 0, micros: 0 };

    /// Split a millisecond bound into whole seconds and a microsecond remainder.
    pub const fn from_millis(millis: u64) -> Self {
        WaitTimeout {
            secs: millis / 1000,
            micros: ((millis % 1000) * 1000) as u32,
        }
    }

    pub const fn secs(self) -> u64 {
        self.secs
    }

    pub const fn subsec_micros(self) -> u32 {
        self.micros
    }

    pub fn as_duration(self) -> Duration {
        Duration::new(self.secs, self.micros * 1000)
    }

    /// Millisecond bound for `poll(2)`/`epoll_wait(2)`, rounded up and clamped
    /// to `c_int`.
    pub fn as_poll_millis(self) -> i32 {
        let millis = self
            .secs
            .saturating_mul(1000)
            .saturating_add(u64::from(self.micros.div_ceil(1000)));
        millis.min(i32::MAX as u64) as i32
    }

    #[cfg(unix)]
    pub(crate) fn as_timeval(self) -> libc::timeval {
        libc::timeval {
            tv_sec: self.secs.min(libc::time_t::MAX as u64) as libc::time_t,
            tv_usec: self.micros as libc::suseconds_t,
        }
    }
}

impl Default for WaitTimeout {
    fn default() -> Self {
        WaitTimeout::from_millis(1000)
    }
}

impl From<Duration> for WaitTimeout {
    fn from(value: Duration) -> Self {
        WaitTimeout {
            secs: value.as_secs(),
            micros: value.subsec_micros(),
        }
    }
}
