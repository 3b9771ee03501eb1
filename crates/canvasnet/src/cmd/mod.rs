use canvasnet_hub::DEFAULT_MAX_USERS;
use canvasnet_message::Stream;
use canvasnet_reactor::Backend;
use clap::{ArgGroup, Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod doctor;
pub mod send;
pub mod serve;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Host a drawing session.
    Serve(ServeArgs),
    /// Join a session, send one message and leave.
    Send(SendArgs),
    /// Join a session and print relayed messages.
    Watch(WatchArgs),
    /// Probe every readiness backend on this host.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Watch(args) => watch::run(args, format),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (use port 0 for an ephemeral port).
    pub addr: String,
    /// Readiness backend: select, poll or epoll. Default: best for this platform.
    #[arg(long, env = "CANVASNET_BACKEND")]
    pub backend: Option<Backend>,
    /// Upper bound of one reactor wait, in milliseconds.
    #[arg(long, env = "CANVASNET_TIMEOUT_MS", default_value_t = 1000)]
    pub timeout_ms: u64,
    /// Participant limit; context ids are handed out from 1 to this value.
    #[arg(
        long,
        env = "CANVASNET_MAX_USERS",
        default_value_t = DEFAULT_MAX_USERS,
        value_parser = clap::value_parser!(u8).range(1..)
    )]
    pub max_users: u8,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("payload").required(true).args(["chat", "title"])))]
pub struct SendArgs {
    /// Hub address to connect to.
    pub addr: String,
    /// Participant name used at login.
    #[arg(long, env = "CANVASNET_NAME", default_value = "canvasnet")]
    pub name: String,
    /// Send a chat line.
    #[arg(long, conflicts_with = "title")]
    pub chat: Option<String>,
    /// Set the session title (only honoured for the session operator).
    #[arg(long, conflicts_with = "chat")]
    pub title: Option<String>,
    /// Wait for the hub to relay the message back and print it.
    #[arg(long)]
    pub wait: bool,
    /// Login and relay timeout, in milliseconds.
    #[arg(long, env = "CANVASNET_TIMEOUT_MS", default_value_t = 5000)]
    pub timeout_ms: u64,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Hub address to connect to.
    pub addr: String,
    /// Participant name used at login.
    #[arg(long, env = "CANVASNET_NAME", default_value = "watcher")]
    pub name: String,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Only print these streams (comma-separated: session, meta, command).
    #[arg(long, value_delimiter = ',')]
    pub streams: Option<Vec<Stream>>,
    /// Login timeout, in milliseconds.
    #[arg(long, env = "CANVASNET_TIMEOUT_MS", default_value_t = 5000)]
    pub timeout_ms: u64,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
