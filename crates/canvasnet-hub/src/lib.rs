//! Session relay for the canvasnet drawing protocol.
//!
//! [`Hub`] is a single-threaded, readiness-driven server: it accepts
//! participants, assigns context ids, relays meta and command messages and
//! keeps the command history that late joiners are brought up to date with.
//! [`Client`] is the matching blocking participant.

pub mod client;
pub mod config;
pub(crate) mod connection;
pub mod error;
pub mod hub;

pub use client::Client;
pub use config::{ClientConfig, HubConfig, DEFAULT_MAX_USERS, DEFAULT_READ_CHUNK};
pub use error::{HubError, Result};
pub use hub::{Hub, HubHandle, SESSION_FULL, WELCOME};
