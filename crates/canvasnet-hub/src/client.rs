use std::io::ErrorKind;
use std::net::TcpStream;

use canvasnet_message::{
    Body, Message, MessageConfig, MessageError, MessageReader, MessageWriter,
};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{HubError, Result};

/// Blocking session participant.
///
/// `connect` performs the login handshake; afterwards every message the hub
/// relays (including the client's own, stamped with its context id) arrives
/// through [`Client::recv`].
pub struct Client {
    reader: MessageReader<TcpStream>,
    writer: MessageWriter<TcpStream>,
    ctx: u8,
    name: String,
    config: ClientConfig,
}

impl Client {
    /// Connect, log in as `name` and wait for the welcome.
    pub fn connect(addr: &str, name: &str, config: ClientConfig) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(|source| HubError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        stream.set_nodelay(true)?;

        let handshake = MessageConfig {
            read_timeout: Some(config.timeout),
            write_timeout: Some(config.timeout),
        };
        let mut writer = MessageWriter::with_config_tcp(stream.try_clone()?, handshake.clone())?;
        let mut reader = MessageReader::with_config_tcp(stream, handshake)?;

        writer
            .write_message(&Message::login(0, name))
            .map_err(|err| login_failure(err, &config))?;

        let welcome = reader
            .read_message()
            .map_err(|err| login_failure(err, &config))?;
        let ctx = match welcome.body() {
            Body::Login(_) if welcome.context_id() != 0 => welcome.context_id(),
            Body::Login(login) => return Err(HubError::Rejected(login.message.clone())),
            _ => {
                return Err(HubError::Protocol(format!(
                    "expected login reply, got {}",
                    welcome.message_type()
                )))
            }
        };

        reader.get_ref().set_read_timeout(config.recv_timeout)?;
        info!(addr, name, ctx, "client: logged in");

        Ok(Self {
            reader,
            writer,
            ctx,
            name: name.to_string(),
            config,
        })
    }

    /// Context id the hub assigned to this participant.
    pub fn context_id(&self) -> u8 {
        self.ctx
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send a message. The hub stamps the context id, so any value works here.
    pub fn send(&mut self, message: &Message) -> Result<()> {
        debug!(kind = %message.message_type(), "client: send");
        self.writer
            .write_message(message)
            .map_err(|err| HubError::from_message(err, Some(self.config.timeout)))
    }

    /// Block for the next relayed message, bounded by `recv_timeout`.
    pub fn recv(&mut self) -> Result<Message> {
        self.reader
            .read_message()
            .map_err(|err| HubError::from_message(err, self.config.recv_timeout))
    }

    /// Close both directions of the connection.
    pub fn close(self) -> Result<()> {
        self.writer.get_ref().shutdown(std::net::Shutdown::Both)?;
        Ok(())
    }
}

/// A hub that is out of room closes the socket right after its notice, which
/// can surface as a reset instead of the notice itself.
fn login_failure(err: MessageError, config: &ClientConfig) -> HubError {
    match err {
        MessageError::ConnectionClosed => {
            HubError::Rejected("connection closed before welcome".to_string())
        }
        MessageError::Io(io)
            if matches!(
                io.kind(),
                ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
            ) =>
        {
            HubError::Rejected(format!("connection dropped before welcome: {io}"))
        }
        other => HubError::from_message(other, Some(config.timeout)),
    }
}
