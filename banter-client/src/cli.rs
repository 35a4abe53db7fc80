//! Command-line argument parsing for the banter client
//!
//! Uses clap for argument parsing with derive macros. CLI arguments
//! override values from the config file.

use clap::Parser;

use crate::config::ClientConfig;

/// banter - terminal chat client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Display name to log in with
    ///
    /// Falls back to the `name` entry in the config file when omitted.
    pub name: Option<String>,

    /// Chat server address (host:port)
    #[arg(long, env = "BANTER_SERVER")]
    pub server: Option<String>,

    /// Base URL of the auth endpoints
    #[arg(long, env = "BANTER_AUTH_URL")]
    pub auth_url: Option<String>,

    /// Seconds to wait for the server to confirm the handshake
    #[arg(long)]
    pub handshake_timeout: Option<u64>,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Apply CLI overrides on top of a loaded config
    pub fn apply_to(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(server) = &self.server {
            config.server = server.clone();
        }
        if let Some(auth_url) = &self.auth_url {
            config.auth_url = auth_url.clone();
        }
        if let Some(secs) = self.handshake_timeout {
            config.handshake_timeout_secs = secs;
        }
        if let Some(name) = &self.name {
            config.name = Some(name.clone());
        }
        config
    }
}
