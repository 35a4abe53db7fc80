//! Data types shared by client and server

use serde::{Deserialize, Serialize};

/// Opaque server-assigned user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An authenticated user as seen by the room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub name: String,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId(id.into()),
            name: name.into(),
        }
    }
}

/// Whether a message was produced by a user or by the room itself
/// (join/leave notices)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    System,
    User,
}

/// One chat message as delivered by the server.
///
/// Field names on the wire follow the server's JSON records; ordering
/// of messages is strictly the order of arrival, never `sent_at`, since
/// timestamps are assigned remotely and are not a reliable sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,

    /// Absent for system messages
    #[serde(
        rename = "userId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sender_id: Option<UserId>,

    #[serde(rename = "name")]
    pub sender_name: String,

    pub text: String,

    /// Milliseconds since the Unix epoch, assigned by the server
    #[serde(rename = "timestamp")]
    pub sent_at: i64,
}

impl ChatMessage {
    /// Construct a user message (primarily for tests and mock servers)
    pub fn user(
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        text: impl Into<String>,
        sent_at: i64,
    ) -> Self {
        Self {
            kind: MessageKind::User,
            sender_id: Some(UserId(sender_id.into())),
            sender_name: sender_name.into(),
            text: text.into(),
            sent_at,
        }
    }

    /// Construct a system message (join/leave notices)
    pub fn system(text: impl Into<String>, sent_at: i64) -> Self {
        Self {
            kind: MessageKind::System,
            sender_id: None,
            sender_name: String::new(),
            text: text.into(),
            sent_at,
        }
    }
}
