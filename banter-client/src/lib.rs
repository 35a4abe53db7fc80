//! banter client - realtime chat session management
//!
//! Connects to a banter chat server: authenticates over HTTP, holds a
//! persistent framed connection, and exposes the session (message log,
//! presence, lifecycle state) through the [`ChatSession`] handle.

pub mod auth;
pub mod cli;
pub mod config;
pub mod connection;
pub mod presence;
pub mod session;
pub mod stream;

#[cfg(test)]
mod testutil;

pub use auth::{AuthClient, Credential};
pub use config::ClientConfig;
pub use session::{ChatSession, SessionConfig, SessionState};
