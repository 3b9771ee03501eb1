use std::io::{ErrorKind, Read};
use std::net::TcpStream;

use bytes::BytesMut;

use crate::codec::{decode_message, MessageConfig};
use crate::error::{MessageError, Result};
use crate::message::Message;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete messages from any `Read` stream.
///
/// Partial reads are buffered internally. A message that fails to decode is
/// still consumed, so after a decode error the next call continues with the
/// following message.
pub struct MessageReader<T> {
    inner: T,
    buf: BytesMut,
    config: MessageConfig,
}

impl<T: Read> MessageReader<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, MessageConfig::default())
    }

    pub fn with_config(inner: T, config: MessageConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns `Err(MessageError::ConnectionClosed)` when EOF is reached.
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            if let Some(message) = decode_message(&mut self.buf)? {
                return Ok(message);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(MessageError::Io(err)),
            };

            if read == 0 {
                return Err(MessageError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Bytes received but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn config(&self) -> &MessageConfig {
        &self.config
    }
}

impl MessageReader<TcpStream> {
    /// Create a reader for a TCP stream and apply the read timeout from config.
    pub fn with_config_tcp(inner: TcpStream, config: MessageConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BufMut;

    use super::*;
    use crate::codec::encode_message;
    use crate::kind::MessageType;
    use crate::writer::MessageWriter;

    fn wire(messages: &[Message]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for message in messages {
            encode_message(message, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_multiple_messages() {
        let bytes = wire(&[
            Message::login(0, "hello"),
            Message::chat(1, "one"),
            Message::undo_point(1),
        ]);
        let mut reader = MessageReader::new(Cursor::new(bytes));

        assert_eq!(reader.read_message().unwrap(), Message::login(0, "hello"));
        assert_eq!(reader.read_message().unwrap(), Message::chat(1, "one"));
        assert_eq!(reader.read_message().unwrap(), Message::undo_point(1));
        assert!(matches!(
            reader.read_message().unwrap_err(),
            MessageError::ConnectionClosed
        ));
    }

    #[test]
    fn partial_read_handling() {
        let reader = ByteByByteReader {
            bytes: wire(&[Message::chat(4, "slow")]),
            pos: 0,
        };
        let mut reader = MessageReader::new(reader);
        assert_eq!(reader.read_message().unwrap(), Message::chat(4, "slow"));
    }

    #[test]
    fn connection_closed_mid_message() {
        let mut partial = BytesMut::new();
        partial.put_u16(16);
        partial.put_u8(MessageType::Chat.as_u8());
        partial.put_slice(b"only");

        let mut reader = MessageReader::new(Cursor::new(partial.to_vec()));
        assert!(matches!(
            reader.read_message().unwrap_err(),
            MessageError::ConnectionClosed
        ));
    }

    #[test]
    fn decode_error_then_resync() {
        let mut bytes = vec![0x00, 0x01, 250, 9];
        bytes.extend(wire(&[Message::chat(2, "still here")]));

        let mut reader = MessageReader::new(Cursor::new(bytes));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, MessageError::UnknownType(250)));
        assert_eq!(reader.read_message().unwrap(), Message::chat(2, "still here"));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedOnce {
            interrupted: false,
            inner: Cursor::new(wire(&[Message::user_leave(8)])),
        };
        let mut reader = MessageReader::new(reader);
        assert_eq!(reader.read_message().unwrap(), Message::user_leave(8));
    }

    #[test]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = MessageWriter::new(left);
        let mut reader = MessageReader::new(right);

        let sender = std::thread::spawn(move || {
            for i in 0..64u8 {
                writer
                    .write_message(&Message::chat(i % 5, format!("msg-{i}")))
                    .unwrap();
            }
        });

        for i in 0..64u8 {
            let msg = reader.read_message().unwrap();
            assert_eq!(msg, Message::chat(i % 5, format!("msg-{i}")));
        }
        sender.join().unwrap();
    }

    #[test]
    fn applies_read_timeout_for_tcp_stream() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (_server, _) = listener.accept().unwrap();

        let cfg = MessageConfig {
            read_timeout: Some(std::time::Duration::from_millis(10)),
            ..MessageConfig::default()
        };
        let mut reader = MessageReader::with_config_tcp(client, cfg).unwrap();
        let err = reader.read_message().unwrap_err();
        assert!(
            matches!(&err, MessageError::Io(io) if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)),
            "unexpected error: {err}"
        );
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedOnce {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedOnce {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
