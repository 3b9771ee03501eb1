use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_message, encode_message};
use crate::error::MessageError;
use crate::handle::MessagePtr;
use crate::message::Message;

/// `tokio_util` codec for the message wire format.
///
/// Decode errors leave the stream aligned on the next message; a `Framed`
/// stream still ends after the first error, so callers that want to skip bad
/// messages should drive [`decode_message`] directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCodec;

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = MessageError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, MessageError> {
        decode_message(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>, MessageError> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => Err(MessageError::ConnectionClosed),
        }
    }
}

impl Encoder<MessagePtr> for MessageCodec {
    type Error = MessageError;

    fn encode(&mut self, item: MessagePtr, dst: &mut BytesMut) -> Result<(), MessageError> {
        encode_message(&item, dst)
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = MessageError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), MessageError> {
        encode_message(&item, dst)
    }
}
