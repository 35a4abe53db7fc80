//! Client-server event types
//!
//! Events travel as `{"event": <name>, "data": <payload>}` records; the
//! names match the chat server's contract exactly.

use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, UserIdentity};

/// Events sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Credential handshake, sent once immediately after the transport
    /// connects
    Authenticate { token: String },

    /// One outgoing chat message; payload is the trimmed text
    ChatMessage(String),
}

/// Events sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Message backlog, sent once after a successful authenticate
    RecentMessages(Vec<ChatMessage>),

    /// One live message, including the sender's own echo
    NewMessage(ChatMessage),

    /// Full presence snapshot, sent on every membership change
    OnlineUsers(Vec<UserIdentity>),

    /// Server-side failure, pre- or post-authentication
    Error { message: String },
}
