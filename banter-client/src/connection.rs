//! Transport connection to the chat server
//!
//! Wraps a single persistent TCP connection carrying length-prefixed JSON
//! events. Opening a connection spawns an I/O task; lifecycle signals and
//! decoded server events are delivered to the session controller over a
//! channel, tagged with the connection's id so a torn-down connection can
//! never touch a newer session's state.

mod client;
mod handler;

pub use client::{ConnSignal, Connection, ConnectionEvent, ConnectionId};
pub use handler::EventSender;
