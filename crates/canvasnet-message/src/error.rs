use crate::kind::MessageType;

/// Errors that can occur while framing or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The type tag is not part of the protocol.
    #[error("unknown message type tag {0}")]
    UnknownType(u8),

    /// The payload does not match the layout of its message type.
    #[error("invalid {message_type} payload: {reason}")]
    InvalidPayload {
        message_type: MessageType,
        reason: &'static str,
    },

    /// The buffer is shorter than the length announced in the header.
    #[error("truncated message ({available} of {needed} bytes)")]
    Truncated { needed: usize, available: usize },

    /// The payload does not fit the 16-bit length prefix.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing messages.
    #[error("message I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete message was received.
    #[error("connection closed (incomplete message)")]
    ConnectionClosed,
}

impl MessageError {
    /// True for protocol-level decode failures.
    ///
    /// The offending message has been skipped, so the stream is still aligned
    /// and the caller may resync or drop the connection.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            MessageError::UnknownType(_)
                | MessageError::InvalidPayload { .. }
                | MessageError::Truncated { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MessageError>;
