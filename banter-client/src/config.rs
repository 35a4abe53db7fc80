//! Client configuration loading
//!
//! Reads the optional config file (~/.config/banter/config.toml) and
//! falls back to defaults when it is missing or malformed. A broken
//! config file is never fatal; it is logged and ignored.

use std::path::Path;

use serde::Deserialize;
use tokio::time::Duration;

use banter_utils::paths::config_file;

use crate::session::SessionConfig;

/// Client configuration (all fields optional in the file)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Chat server address (host:port)
    pub server: String,
    /// Base URL of the auth endpoints
    pub auth_url: String,
    /// Seconds to wait for the server to confirm the handshake
    pub handshake_timeout_secs: u64,
    /// Display name to log in with; the CLI argument overrides this
    pub name: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1:5002".into(),
            auth_url: "http://127.0.0.1:5001".into(),
            handshake_timeout_secs: 10,
            name: None,
        }
    }
}

impl ClientConfig {
    /// Load from the default config file location
    pub fn load() -> Self {
        Self::load_from(&config_file())
    }

    /// Load from a specific path, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("Config file not found, using defaults");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Convert to the session controller's configuration
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            server_addr: self.server.clone(),
            auth_base_url: self.auth_url.clone(),
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs),
        }
    }
}
