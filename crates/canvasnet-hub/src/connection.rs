use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::os::fd::AsRawFd;

use bytes::{Buf, BytesMut};
use canvasnet_message::{decode_message, encode_message, Message, MessagePtr, MAX_MESSAGE_SIZE};
use canvasnet_reactor::{Descriptor, EventMask};

use crate::error::Result;

/// Encoded bytes gathered per write burst.
const WRITE_BATCH: usize = 64 * 1024;

/// Undecoded bytes a connection may hold before `fill` stops reading. Large
/// enough for one complete message of the maximum size.
pub(crate) const READ_BUDGET: usize = MAX_MESSAGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadOutcome {
    /// The socket has no more data for now.
    Drained,
    /// The read budget is used up; the socket may still be readable and the
    /// next wait reports it again.
    Paused,
    /// The peer closed its side.
    Closed,
}

/// One participant socket owned by the hub thread.
///
/// Outbound messages stay shared until the moment they are written.
#[derive(Debug)]
pub(crate) struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    ctx: u8,
    name: Option<String>,
    operator: bool,
    inbound: BytesMut,
    outbound: VecDeque<MessagePtr>,
    pending: BytesMut,
    registered: EventMask,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, ctx: u8) -> Self {
        Self {
            stream,
            peer,
            ctx,
            name: None,
            operator: false,
            inbound: BytesMut::new(),
            outbound: VecDeque::new(),
            pending: BytesMut::new(),
            registered: EventMask::READ,
        }
    }

    pub fn fd(&self) -> Descriptor {
        self.stream.as_raw_fd()
    }

    pub fn ctx(&self) -> u8 {
        self.ctx
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.name.is_some()
    }

    pub fn log_in(&mut self, name: String, operator: bool) {
        self.name = Some(name);
        self.operator = operator;
    }

    pub fn is_operator(&self) -> bool {
        self.operator
    }

    pub fn set_operator(&mut self, operator: bool) {
        self.operator = operator;
    }

    /// Read until the socket would block, the peer closes or [`READ_BUDGET`]
    /// undecoded bytes are buffered.
    pub fn fill(&mut self, chunk: usize) -> std::io::Result<ReadOutcome> {
        let mut buf = vec![0u8; chunk.max(1)];
        while self.inbound.len() < READ_BUDGET {
            match self.stream.read(&mut buf) {
                Ok(0) => return Ok(ReadOutcome::Closed),
                Ok(n) => self.inbound.extend_from_slice(&buf[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    return Ok(ReadOutcome::Drained)
                }
                Err(err) => return Err(err),
            }
        }
        Ok(ReadOutcome::Paused)
    }

    /// Received bytes not yet decoded.
    pub fn buffered(&self) -> usize {
        self.inbound.len()
    }

    pub fn next_message(&mut self) -> canvasnet_message::Result<Option<Message>> {
        decode_message(&mut self.inbound)
    }

    pub fn queue(&mut self, message: MessagePtr) {
        self.outbound.push_back(message);
    }

    pub fn wants_write(&self) -> bool {
        !self.pending.is_empty() || !self.outbound.is_empty()
    }

    /// Interest the reactor should hold for this connection.
    pub fn interest(&self) -> EventMask {
        if self.wants_write() {
            EventMask::READ | EventMask::WRITE
        } else {
            EventMask::READ
        }
    }

    pub fn registered(&self) -> EventMask {
        self.registered
    }

    pub fn set_registered(&mut self, interest: EventMask) {
        self.registered = interest;
    }

    /// Write queued messages until the queue is empty or the socket would block.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            while self.pending.len() < WRITE_BATCH {
                let Some(next) = self.outbound.pop_front() else {
                    break;
                };
                encode_message(&next, &mut self.pending)?;
            }
            if self.pending.is_empty() {
                return Ok(());
            }
            match self.stream.write(&self.pending) {
                Ok(0) => return Err(std::io::Error::from(ErrorKind::WriteZero).into()),
                Ok(n) => self.pending.advance(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Context ids handed out to participants, lowest free first.
#[derive(Debug)]
pub(crate) struct ContextPool {
    in_use: [bool; 256],
    max: u8,
}

impl ContextPool {
    pub fn new(max: u8) -> Self {
        Self {
            in_use: [false; 256],
            max,
        }
    }

    /// Reserve the lowest free id in `1..=max`.
    pub fn acquire(&mut self) -> Option<u8> {
        let ctx = (1..=self.max).find(|ctx| !self.in_use[usize::from(*ctx)])?;
        self.in_use[usize::from(ctx)] = true;
        Some(ctx)
    }

    pub fn release(&mut self, ctx: u8) {
        self.in_use[usize::from(ctx)] = false;
    }

    pub fn in_use(&self) -> usize {
        self.in_use.iter().filter(|used| **used).count()
    }
}
