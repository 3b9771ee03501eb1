use std::time::Duration;

use canvasnet_message::MessageError;
use canvasnet_reactor::ReactorError;

/// Errors that can occur in hub and client operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Readiness multiplexer failure.
    #[error("reactor error: {0}")]
    Reactor(#[from] ReactorError),

    /// Framing or decoding failure.
    #[error("message error: {0}")]
    Message(#[from] MessageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The hub refused the login (for example, the session is full).
    #[error("login rejected: {0}")]
    Rejected(String),

    /// A blocking operation did not complete in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The peer sent something the protocol does not allow at this point.
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl HubError {
    /// Map read/write timeouts surfaced by the message layer to `Timeout`.
    pub(crate) fn from_message(err: MessageError, timeout: Option<Duration>) -> Self {
        match (err, timeout) {
            (MessageError::Io(io), Some(limit))
                if matches!(
                    io.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                HubError::Timeout(limit)
            }
            (err, _) => HubError::Message(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_timeout_maps_to_timeout() {
        let limit = Duration::from_millis(50);
        let err = HubError::from_message(
            MessageError::Io(std::io::Error::from(std::io::ErrorKind::WouldBlock)),
            Some(limit),
        );
        assert!(matches!(err, HubError::Timeout(d) if d == limit));
    }

    #[test]
    fn other_errors_pass_through() {
        let err = HubError::from_message(MessageError::ConnectionClosed, Some(Duration::ZERO));
        assert!(matches!(
            err,
            HubError::Message(MessageError::ConnectionClosed)
        ));

        let err = HubError::from_message(
            MessageError::Io(std::io::Error::from(std::io::ErrorKind::WouldBlock)),
            None,
        );
        assert!(matches!(err, HubError::Message(MessageError::Io(_))));
    }
}
