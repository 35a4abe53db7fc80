//! banter-protocol: Shared wire definitions for the banter chat service
//!
//! This crate defines the event types and framing codec used on the
//! persistent connection between a banter client and the chat server.

pub mod codec;
pub mod events;
pub mod types;

// Re-export main types at crate root
pub use codec::{ClientCodec, CodecError, ServerCodec};
pub use events::{ClientEvent, ServerEvent};
pub use types::{ChatMessage, MessageKind, UserId, UserIdentity};
