//! Ordered message stream
//!
//! Holds the append-only message log for one session. The log's order is
//! strictly arrival order: the backlog first, then each live message as
//! it comes in. Nothing is ever reordered, removed, or deduplicated; the
//! server's delivery guarantees are its own business.

use banter_protocol::ChatMessage;
use banter_utils::{BanterError, Result};

/// Append-only view of the room's messages
#[derive(Debug, Default)]
pub struct MessageStream {
    log: Vec<ChatMessage>,
    backlog_seen: bool,
}

impl MessageStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the message backlog, replacing the log wholesale.
    ///
    /// Valid exactly once, immediately after authentication. A later
    /// delivery is a protocol error; the existing log is left untouched
    /// and the caller decides how loudly to complain.
    pub fn on_backlog(&mut self, messages: Vec<ChatMessage>) -> Result<()> {
        if self.backlog_seen {
            return Err(BanterError::protocol(
                "received a second message backlog",
            ));
        }
        self.backlog_seen = true;
        self.log = messages;
        Ok(())
    }

    /// Append one live message. Arrival order is the authoritative chat
    /// order.
    pub fn on_incoming(&mut self, message: ChatMessage) {
        self.log.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

/// Validate outgoing message text.
///
/// Trims whitespace; an empty result is rejected locally and never
/// reaches the network.
pub fn prepare_submission(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(BanterError::EmptyMessage);
    }
    Ok(trimmed.to_string())
}
