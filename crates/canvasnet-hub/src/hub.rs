use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::os::fd::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use canvasnet_message::payload::UserAttr;
use canvasnet_message::{Body, Message, MessageHistory, MessagePtr, MessageType, Stream};
use canvasnet_reactor::{open, Descriptor, Event, EventMask, Multiplexer, Waker};
use tracing::{debug, info, trace, warn};

use crate::config::HubConfig;
use crate::connection::{Connection, ContextPool, ReadOutcome};
use crate::error::{HubError, Result};

/// Text of the hub's reply to a successful login.
pub const WELCOME: &str = "welcome";

/// Text sent (with context id 0) to a connection refused for lack of room.
pub const SESSION_FULL: &str = "session full";

/// Cross-thread control for a running [`Hub`].
#[derive(Debug, Clone)]
pub struct HubHandle {
    shutdown: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl HubHandle {
    /// Ask the hub loop to stop and wake it if it is blocked in a wait.
    pub fn shutdown(&self) -> Result<()> {
        self.shutdown.store(true, Ordering::Release);
        self.waker.wake()?;
        Ok(())
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

/// Single-threaded relay for one drawing session.
///
/// The hub thread owns the multiplexer, the listener and every connection.
/// Readiness drives all I/O: sockets are non-blocking and a connection only
/// holds `WRITE` interest while it has queued output.
pub struct Hub {
    listener: TcpListener,
    local_addr: SocketAddr,
    mux: Box<dyn Multiplexer>,
    waker: Arc<Waker>,
    shutdown: Arc<AtomicBool>,
    config: HubConfig,
    connections: HashMap<Descriptor, Connection>,
    contexts: ContextPool,
    history: MessageHistory,
    title: Option<MessagePtr>,
}

impl Hub {
    /// Bind a listening socket and prepare the reactor.
    pub fn bind(addr: &str, config: HubConfig) -> Result<Self> {
        if config.max_users == 0 {
            return Err(HubError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                "max_users must be at least 1",
            )));
        }

        let listener = TcpListener::bind(addr).map_err(|source| HubError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let mut mux = open(config.backend)?;
        mux.set_timeout(config.wait_timeout);
        let waker = Arc::new(Waker::new()?);
        mux.add(listener.as_raw_fd(), EventMask::READ)?;
        mux.add(waker.fd(), EventMask::READ)?;

        info!(
            %local_addr,
            backend = %config.backend,
            max_users = config.max_users,
            "hub: listening"
        );

        Ok(Self {
            listener,
            local_addr,
            mux,
            waker,
            shutdown: Arc::new(AtomicBool::new(false)),
            contexts: ContextPool::new(config.max_users),
            config,
            connections: HashMap::new(),
            history: MessageHistory::new(),
            title: None,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn handle(&self) -> HubHandle {
        HubHandle {
            shutdown: Arc::clone(&self.shutdown),
            waker: Arc::clone(&self.waker),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Command history of the session so far.
    pub fn history(&self) -> &MessageHistory {
        &self.history
    }

    /// Run the event loop until [`HubHandle::shutdown`] is called.
    ///
    /// Only reactor failures end the loop with an error; a failing connection
    /// is disconnected and the session carries on.
    pub fn run(&mut self) -> Result<()> {
        while !self.shutdown.load(Ordering::Acquire) {
            if self.mux.wait()? == 0 {
                continue;
            }
            while let Some(event) = self.mux.next_event() {
                self.dispatch(event)?;
            }
            self.sync_interest();
        }

        info!(connections = self.connections.len(), "hub: shutting down");
        for (fd, conn) in self.connections.drain() {
            if let Err(err) = self.mux.remove(fd) {
                debug!(fd, error = %err, "hub: remove on shutdown failed");
            }
            drop(conn);
        }
        Ok(())
    }

    fn dispatch(&mut self, event: Event) -> Result<()> {
        trace!(fd = event.fd, mask = ?event.mask, "hub: event");
        if event.fd == self.listener.as_raw_fd() {
            self.accept_pending();
        } else if event.fd == self.waker.fd() {
            self.waker.drain()?;
        } else {
            if event.mask.is_readable() {
                self.receive(event.fd);
            }
            if event.mask.is_writable() {
                self.flush(event.fd);
            }
        }
        Ok(())
    }

    fn accept_pending(&mut self) {
        loop {
            let (stream, peer) = match self.listener.accept() {
                Ok(pair) => pair,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(error = %err, "hub: accept failed");
                    return;
                }
            };

            let Some(ctx) = self.contexts.acquire() else {
                warn!(%peer, max_users = self.config.max_users, "hub: session full");
                refuse(stream);
                continue;
            };

            if let Err(err) = stream
                .set_nonblocking(true)
                .and_then(|()| stream.set_nodelay(true))
            {
                warn!(%peer, error = %err, "hub: cannot configure socket");
                self.contexts.release(ctx);
                continue;
            }

            let conn = Connection::new(stream, peer, ctx);
            let fd = conn.fd();
            if let Err(err) = self.mux.add(fd, EventMask::READ) {
                warn!(%peer, error = %err, "hub: cannot watch connection");
                self.contexts.release(ctx);
                continue;
            }
            self.connections.insert(fd, conn);
            info!(%peer, ctx, "hub: accepted");
        }
    }

    fn receive(&mut self, fd: Descriptor) {
        let chunk = self.config.read_chunk;
        let Some(conn) = self.connections.get_mut(&fd) else {
            return;
        };
        let outcome = match conn.fill(chunk) {
            Ok(outcome) => outcome,
            Err(err) => return self.disconnect(fd, &format!("read failed: {err}")),
        };

        loop {
            let Some(conn) = self.connections.get_mut(&fd) else {
                return;
            };
            match conn.next_message() {
                Ok(Some(message)) => self.handle_message(fd, message),
                Ok(None) => break,
                Err(err) => return self.disconnect(fd, &format!("undecodable message: {err}")),
            }
        }

        if outcome == ReadOutcome::Closed {
            self.disconnect(fd, "peer closed");
        }
    }

    fn flush(&mut self, fd: Descriptor) {
        let Some(conn) = self.connections.get_mut(&fd) else {
            return;
        };
        if let Err(err) = conn.flush() {
            self.disconnect(fd, &format!("write failed: {err}"));
        }
    }

    fn handle_message(&mut self, fd: Descriptor, message: Message) {
        let Some(conn) = self.connections.get(&fd) else {
            return;
        };
        let (ctx, logged_in, operator) = (conn.ctx(), conn.is_logged_in(), conn.is_operator());

        match message.stream() {
            Stream::Session => self.login(fd, &message),
            _ if !logged_in => self.disconnect(
                fd,
                &format!("{} before login", message.message_type()),
            ),
            Stream::Meta => self.relay_meta(ctx, operator, message),
            Stream::Command => self.relay_command(ctx, operator, message),
        }
    }

    fn login(&mut self, fd: Descriptor, message: &Message) {
        let Body::Login(login) = message.body() else {
            return;
        };
        let operator = !self.connections.values().any(Connection::is_logged_in);

        let Some(conn) = self.connections.get_mut(&fd) else {
            return;
        };
        let ctx = conn.ctx();
        if conn.is_logged_in() {
            debug!(ctx, "hub: repeated login ignored");
            return;
        }
        let name = match login.message.trim() {
            "" => format!("user-{ctx}"),
            name => name.to_string(),
        };
        conn.log_in(name.clone(), operator);

        let mut roster = Vec::new();
        for other in self.connections.values() {
            let Some(other_name) = other.name() else {
                continue;
            };
            if other.ctx() == ctx {
                continue;
            }
            roster.push(MessagePtr::new(Message::user_join(other.ctx(), other_name)));
            if other.is_operator() {
                roster.push(operator_attr(other.ctx()));
            }
        }

        let Some(conn) = self.connections.get_mut(&fd) else {
            return;
        };
        conn.queue(MessagePtr::new(Message::login(ctx, WELCOME)));
        for entry in roster {
            conn.queue(entry);
        }
        if let Some(title) = &self.title {
            conn.queue(title.clone());
        }
        for entry in self.history.iter() {
            conn.queue(entry.clone());
        }

        info!(ctx, name = %name, operator, history = self.history.len(), "hub: login");
        self.broadcast(&MessagePtr::new(Message::user_join(ctx, name)));
        if operator {
            self.broadcast(&operator_attr(ctx));
        }
    }

    fn relay_meta(&mut self, ctx: u8, operator: bool, mut message: Message) {
        let kind = message.message_type();
        if matches!(
            kind,
            MessageType::UserJoin
                | MessageType::UserAttr
                | MessageType::UserLeave
                | MessageType::StreamPos
        ) {
            warn!(ctx, %kind, "hub: dropping server-only message");
            return;
        }
        if message.is_op_command() && !operator {
            warn!(ctx, %kind, "hub: dropping operator command from non-operator");
            return;
        }

        message.set_context_id(ctx);
        let shared = MessagePtr::new(message);
        if kind == MessageType::SessionTitle {
            self.title = Some(shared.clone());
        }
        self.broadcast(&shared);
    }

    fn relay_command(&mut self, ctx: u8, operator: bool, mut message: Message) {
        message.set_context_id(ctx);

        if let Body::Undo(undo) = message.body() {
            let target = match undo.override_user {
                0 => ctx,
                own if own == ctx => ctx,
                other if operator => other,
                other => {
                    warn!(ctx, target = other, "hub: dropping undo override from non-operator");
                    return;
                }
            };
            let steps = self.history.undo(target, undo.points);
            debug!(ctx, target, points = undo.points, steps, "hub: undo applied");
        }

        let shared = MessagePtr::new(message);
        self.history.push(shared.clone());
        self.broadcast(&shared);
    }

    /// Queue a message to every logged-in participant, sender included.
    fn broadcast(&mut self, message: &MessagePtr) {
        for conn in self.connections.values_mut() {
            if conn.is_logged_in() {
                conn.queue(message.clone());
            }
        }
    }

    fn disconnect(&mut self, fd: Descriptor, reason: &str) {
        let Some(conn) = self.connections.remove(&fd) else {
            return;
        };
        if let Err(err) = self.mux.remove(fd) {
            warn!(fd, error = %err, "hub: cannot unwatch connection");
        }
        let ctx = conn.ctx();
        self.contexts.release(ctx);
        let (logged_in, operator) = (conn.is_logged_in(), conn.is_operator());
        info!(ctx, peer = %conn.peer(), reason, "hub: disconnected");
        drop(conn);

        if logged_in {
            self.broadcast(&MessagePtr::new(Message::user_leave(ctx)));
            if operator {
                self.promote_operator();
            }
        }
    }

    /// Hand the operator role to the remaining participant with the lowest id.
    fn promote_operator(&mut self) {
        let Some(next) = self
            .connections
            .values_mut()
            .filter(|conn| conn.is_logged_in())
            .min_by_key(|conn| conn.ctx())
        else {
            return;
        };
        next.set_operator(true);
        let ctx = next.ctx();
        info!(ctx, "hub: operator promoted");
        self.broadcast(&operator_attr(ctx));
    }

    /// Bring every connection's registered interest in line with its queue.
    fn sync_interest(&mut self) {
        loop {
            let mut failed = Vec::new();
            for conn in self.connections.values_mut() {
                let wanted = conn.interest();
                if wanted == conn.registered() {
                    continue;
                }
                match self.mux.modify(conn.fd(), wanted) {
                    Ok(()) => conn.set_registered(wanted),
                    Err(err) => failed.push((conn.fd(), err.to_string())),
                }
            }
            if failed.is_empty() {
                return;
            }
            for (fd, reason) in failed {
                self.disconnect(fd, &reason);
            }
        }
    }
}

fn operator_attr(ctx: u8) -> MessagePtr {
    MessagePtr::new(Message::new(
        ctx,
        UserAttr {
            attrs: UserAttr::OPERATOR,
        },
    ))
}

/// Best-effort rejection notice for a connection the session has no room for.
///
/// One non-blocking write on a fresh socket; the reactor thread never waits
/// on a refused peer.
fn refuse(stream: TcpStream) {
    let notice = match Message::login(0, SESSION_FULL).to_bytes() {
        Ok(notice) => notice,
        Err(err) => {
            debug!(error = %err, "hub: cannot encode rejection notice");
            return;
        }
    };
    let result = stream
        .set_nonblocking(true)
        .and_then(|()| (&stream).write(&notice));
    match result {
        Ok(written) if written == notice.len() => {}
        Ok(written) => debug!(written, "hub: rejection notice truncated"),
        Err(err) => debug!(error = %err, "hub: rejection notice not delivered"),
    }
}
