use std::time::Duration;

use canvasnet_reactor::{Backend, WaitTimeout};

/// Default participant limit per session.
pub const DEFAULT_MAX_USERS: u8 = 32;

/// Default socket read size per readiness event.
pub const DEFAULT_READ_CHUNK: usize = 16 * 1024;

/// Hub (server) configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Readiness facility driving the event loop.
    pub backend: Backend,
    /// Upper bound of one reactor wait. Shutdown does not depend on it since
    /// the handle wakes the reactor directly.
    pub wait_timeout: WaitTimeout,
    /// Context ids are handed out from `1..=max_users`.
    pub max_users: u8,
    /// Bytes read per `read` call while draining a socket.
    pub read_chunk: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default_for_platform(),
            wait_timeout: WaitTimeout::default(),
            max_users: DEFAULT_MAX_USERS,
            read_chunk: DEFAULT_READ_CHUNK,
        }
    }
}

/// Blocking client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bound for connect-time login and every write.
    pub timeout: Duration,
    /// Bound for [`Client::recv`](crate::Client::recv). `None` waits forever.
    pub recv_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            recv_timeout: None,
        }
    }
}
