//! Error types for banter
//!
//! Provides a unified error type used across all banter crates.

use std::path::PathBuf;

/// Main error type for banter operations
#[derive(Debug, thiserror::Error)]
pub enum BanterError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Authentication Errors ===

    #[error("{0}")]
    AuthRejected(String),

    // === Transport Errors ===

    #[error("Connection failed: {0}")]
    Transport(String),

    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    #[error("Authentication handshake timed out after {seconds}s")]
    HandshakeTimeout { seconds: u64 },

    // === Protocol Errors ===

    #[error("Protocol error: {0}")]
    Protocol(String),

    // === Validation Errors (local, never sent) ===

    #[error("Message is empty")]
    EmptyMessage,

    #[error("No active session")]
    NotActive,

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BanterError {
    /// Create an auth rejection carrying the server's message
    pub fn auth_rejected(msg: impl Into<String>) -> Self {
        Self::AuthRejected(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this error is a local validation failure, rejected at
    /// the call site without ever reaching the session or the network
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyMessage | Self::NotActive)
    }

    /// Check if this error should move the session to Errored
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            Self::AuthRejected(_)
                | Self::Transport(_)
                | Self::ConnectionClosed
                | Self::HandshakeTimeout { .. }
        )
    }
}

/// Result type alias using BanterError
pub type Result<T> = std::result::Result<T, BanterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BanterError::auth_rejected("name taken");
        assert_eq!(err.to_string(), "name taken");

        let err = BanterError::HandshakeTimeout { seconds: 10 };
        assert_eq!(
            err.to_string(),
            "Authentication handshake timed out after 10s"
        );
    }

    #[test]
    fn test_validation_predicate() {
        assert!(BanterError::EmptyMessage.is_validation());
        assert!(BanterError::NotActive.is_validation());
        assert!(!BanterError::ConnectionClosed.is_validation());
    }

    #[test]
    fn test_session_fatal_predicate() {
        assert!(BanterError::transport("refused").is_session_fatal());
        assert!(BanterError::HandshakeTimeout { seconds: 5 }.is_session_fatal());
        assert!(!BanterError::EmptyMessage.is_session_fatal());
        assert!(!BanterError::protocol("late backlog").is_session_fatal());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: BanterError = io_err.into();
        assert!(matches!(err, BanterError::Io(_)));
    }
}
