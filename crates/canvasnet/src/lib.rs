//! Transport core for collaborative drawing sessions.
//!
//! # Crate Structure
//!
//! - [`reactor`]: readiness multiplexing over select, poll and epoll
//! - [`message`]: the drawing-protocol envelope, framing codec and shared handles
//! - [`hub`]: the session relay and blocking client (behind the `hub` feature)

/// Re-export reactor types.
pub mod reactor {
    pub use canvasnet_reactor::*;
}

/// Re-export message types.
pub mod message {
    pub use canvasnet_message::*;
}

/// Re-export hub types (requires `hub` feature).
#[cfg(feature = "hub")]
pub mod hub {
    pub use canvasnet_hub::*;
}
