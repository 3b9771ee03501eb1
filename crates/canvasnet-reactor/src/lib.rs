//! Portable readiness multiplexing.
//!
//! Provides one interface over the native readiness facilities:
//! - `select(2)` (all Unix targets)
//! - `poll(2)` (all Unix targets)
//! - `epoll(7)` (Linux)
//!
//! This is the lowest layer of canvasnet. Callers register descriptor
//! interest, block in [`Multiplexer::wait`], then drain the ready set with
//! [`Multiplexer::next_event`]. Every backend yields ready descriptors in
//! registration order and reports the same [`EventMask`] bits for the same
//! socket state.

pub mod error;
pub mod event;
pub(crate) mod registry;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod epoll;
#[cfg(unix)]
pub mod poll;
#[cfg(unix)]
pub mod select;
#[cfg(unix)]
pub mod waker;

pub use error::{ReactorError, Result};
pub use event::{Descriptor, Event, EventMask, WaitTimeout, INVALID_DESCRIPTOR};
pub use traits::{open, Backend, Multiplexer};

#[cfg(target_os = "linux")]
pub use epoll::EpollMultiplexer;
#[cfg(unix)]
pub use poll::PollMultiplexer;
#[cfg(unix)]
pub use select::{Direction, SelectMultiplexer};
#[cfg(unix)]
pub use waker::Waker;
