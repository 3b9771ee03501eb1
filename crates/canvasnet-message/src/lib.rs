//! Drawing-protocol messages and their wire framing.
//!
//! Every message travels as:
//! - A 2-byte big-endian payload length (so two bytes give the full size)
//! - A 1-byte message type tag
//! - The payload: the context id of the originating participant, then the
//!   type-specific body
//!
//! Type tags split into three streams. Tags from 128 up form the command
//! stream, which alone is enough to rebuild the canvas by replay. Once
//! decoded, messages are shared through [`MessagePtr`] so one message can be
//! queued to many connections without copying.

pub mod codec;
pub mod error;
pub mod handle;
pub mod history;
pub mod kind;
pub mod message;
pub mod payload;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    decode_message, deserialize, encode_message, sniff_length, MessageConfig, HEADER_SIZE,
    MAX_MESSAGE_SIZE, MAX_PAYLOAD_SIZE,
};
pub use error::{MessageError, Result};
pub use handle::MessagePtr;
pub use history::MessageHistory;
pub use kind::{MessageType, Stream, COMMAND_TAG_START};
pub use message::{Body, Message};
pub use reader::MessageReader;
pub use writer::MessageWriter;

#[cfg(feature = "async")]
pub use async_codec::MessageCodec;
