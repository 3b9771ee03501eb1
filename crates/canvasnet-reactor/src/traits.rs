use std::fmt;
use std::str::FromStr;

use crate::error::{ReactorError, Result};
use crate::event::{Descriptor, Event, EventMask, WaitTimeout};

/// A readiness multiplexer over a set of registered descriptors.
///
/// One `wait` per cycle; all registration changes and event draining happen
/// on the owning thread between waits.
///
/// Precondition violations (invalid descriptor, registering twice, touching
/// an unregistered descriptor, draining without a positive wait) panic. They
/// are caller bugs, not conditions to recover from.
pub trait Multiplexer: Send {
    /// Which native facility backs this multiplexer.
    fn backend(&self) -> Backend;

    /// Register interest in `fd`. `interest` must be non-empty.
    fn add(&mut self, fd: Descriptor, interest: EventMask) -> Result<()>;

    /// Replace the interest of a registered descriptor.
    ///
    /// An empty mask removes the registration, exactly like [`remove`](Self::remove).
    fn modify(&mut self, fd: Descriptor, interest: EventMask) -> Result<()>;

    /// Unregister `fd`. It will not be yielded from the current snapshot.
    fn remove(&mut self, fd: Descriptor) -> Result<()>;

    /// Block until a registered descriptor is ready or the timeout elapses.
    ///
    /// Returns the number of descriptors with at least one satisfied interest.
    /// Interruption by a signal returns `Ok(0)`.
    fn wait(&mut self) -> Result<usize>;

    /// Next ready descriptor from the last wait, in registration order.
    fn next_event(&mut self) -> Option<Event>;

    /// Set the bound used by subsequent waits.
    fn set_timeout(&mut self, timeout: WaitTimeout);

    fn timeout(&self) -> WaitTimeout;

    /// Current interest of `fd`, if registered.
    fn interest(&self, fd: Descriptor) -> Option<EventMask>;

    /// Number of registered descriptors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Native readiness facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Select,
    Poll,
    Epoll,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Select => "select",
            Backend::Poll => "poll",
            Backend::Epoll => "epoll",
        }
    }

    /// Backends compiled for this platform.
    pub fn available() -> &'static [Backend] {
        #[cfg(target_os = "linux")]
        {
            &[Backend::Epoll, Backend::Poll, Backend::Select]
        }
        #[cfg(all(unix, not(target_os = "linux")))]
        {
            &[Backend::Poll, Backend::Select]
        }
        #[cfg(not(unix))]
        {
            &[]
        }
    }

    pub fn is_available(self) -> bool {
        Self::available().contains(&self)
    }

    /// Preferred backend for this platform.
    pub fn default_for_platform() -> Backend {
        if cfg!(target_os = "linux") {
            Backend::Epoll
        } else {
            Backend::Poll
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(Backend::Select),
            "poll" => Ok(Backend::Poll),
            "epoll" => Ok(Backend::Epoll),
            other => Err(format!(
                "unknown backend `{other}` (expected select, poll or epoll)"
            )),
        }
    }
}

/// Open a multiplexer on the requested backend.
pub fn open(backend: Backend) -> Result<Box<dyn Multiplexer>> {
    match backend {
        #[cfg(unix)]
        Backend::Select => Ok(Box::new(crate::select::SelectMultiplexer::new())),
        #[cfg(unix)]
        Backend::Poll => Ok(Box::new(crate::poll::PollMultiplexer::new())),
        #[cfg(target_os = "linux")]
        Backend::Epoll => Ok(Box::new(crate::epoll::EpollMultiplexer::new()?)),
        #[allow(unreachable_patterns)]
        other => Err(ReactorError::Unsupported(other.name())),
    }
}
