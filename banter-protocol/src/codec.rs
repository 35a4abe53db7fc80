//! Event codec for wire framing
//!
//! Frames are a u32 big-endian length prefix followed by the JSON-encoded
//! event record.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::events::{ClientEvent, ServerEvent};

/// Maximum event size (1 MB); chat payloads are tiny, anything larger is
/// a corrupt or hostile frame
const MAX_EVENT_SIZE: usize = 1024 * 1024;

/// Protocol codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Event too large: {size} bytes (max {max})")]
    EventTooLarge { size: usize, max: usize },
}

/// Codec for ClientEvent (encoding) and ServerEvent (decoding)
/// Used by the client side
pub struct ClientCodec;

impl ClientCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClientCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ClientCodec {
    type Item = ServerEvent;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_event(src)
    }
}

impl Encoder<ClientEvent> for ClientCodec {
    type Error = CodecError;

    fn encode(&mut self, item: ClientEvent, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_event(&item, dst)
    }
}

/// Codec for ServerEvent (encoding) and ClientEvent (decoding)
/// Used by the server side (and by mock servers in tests)
pub struct ServerCodec;

impl ServerCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ServerCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ServerCodec {
    type Item = ClientEvent;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_event(src)
    }
}

impl Encoder<ServerEvent> for ServerCodec {
    type Error = CodecError;

    fn encode(&mut self, item: ServerEvent, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_event(&item, dst)
    }
}

/// Decode a length-prefixed event
fn decode_event<T: serde::de::DeserializeOwned>(
    src: &mut BytesMut,
) -> Result<Option<T>, CodecError> {
    // Need at least 4 bytes for length prefix
    if src.len() < 4 {
        return Ok(None);
    }

    // Peek at length without consuming
    let len = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

    if len > MAX_EVENT_SIZE {
        return Err(CodecError::EventTooLarge {
            size: len,
            max: MAX_EVENT_SIZE,
        });
    }

    // Check if we have the full event
    if src.len() < 4 + len {
        src.reserve(4 + len - src.len());
        return Ok(None);
    }

    // Consume length prefix
    src.advance(4);

    let data = src.split_to(len);
    let event: T = serde_json::from_slice(&data)?;
    Ok(Some(event))
}

/// Encode a length-prefixed event
fn encode_event<T: serde::Serialize>(item: &T, dst: &mut BytesMut) -> Result<(), CodecError> {
    let data = serde_json::to_vec(item)?;

    if data.len() > MAX_EVENT_SIZE {
        return Err(CodecError::EventTooLarge {
            size: data.len(),
            max: MAX_EVENT_SIZE,
        });
    }

    dst.reserve(4 + data.len());
    dst.put_u32(data.len() as u32);
    dst.put_slice(&data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatMessage, UserIdentity};

    #[test]
    fn test_client_event_roundtrip() {
        let mut codec = ClientCodec::new();
        let mut server_codec = ServerCodec::new();

        let ev = ClientEvent::Authenticate {
            token: "secret-token".into(),
        };

        let mut buf = BytesMut::new();
        codec.encode(ev.clone(), &mut buf).unwrap();

        let decoded = server_codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(format!("{:?}", ev), format!("{:?}", decoded));
    }

    #[test]
    fn test_server_event_roundtrip() {
        let mut codec = ServerCodec::new();
        let mut client_codec = ClientCodec::new();

        let ev = ServerEvent::NewMessage(ChatMessage::user("u1", "Alice", "hi", 1));

        let mut buf = BytesMut::new();
        codec.encode(ev.clone(), &mut buf).unwrap();

        let decoded = client_codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(format!("{:?}", ev), format!("{:?}", decoded));
    }

    #[test]
    fn test_partial_frame() {
        let mut codec = ClientCodec::new();
        let mut server_codec = ServerCodec::new();

        let ev = ClientEvent::ChatMessage("hello".into());

        let mut buf = BytesMut::new();
        codec.encode(ev, &mut buf).unwrap();

        // Split buffer to simulate partial read
        let mut partial = buf.split_to(2);

        assert!(server_codec.decode(&mut partial).unwrap().is_none());

        // Add rest of frame
        partial.unsplit(buf);

        assert!(server_codec.decode(&mut partial).unwrap().is_some());
    }

    #[test]
    fn test_event_too_large_on_decode() {
        let mut codec = ClientCodec::new();
        let mut buf = BytesMut::new();

        let huge_size: u32 = (MAX_EVENT_SIZE + 1) as u32;
        buf.put_u32(huge_size);

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(CodecError::EventTooLarge { .. })));
    }

    #[test]
    fn test_all_server_event_variants() {
        let mut codec = ServerCodec::new();
        let mut client_codec = ClientCodec::new();

        let events = vec![
            ServerEvent::RecentMessages(vec![
                ChatMessage::system("Alice joined", 1),
                ChatMessage::user("u1", "Alice", "hi", 2),
            ]),
            ServerEvent::NewMessage(ChatMessage::user("u2", "Bob", "hey", 3)),
            ServerEvent::OnlineUsers(vec![
                UserIdentity::new("u1", "Alice"),
                UserIdentity::new("u2", "Bob"),
            ]),
            ServerEvent::Error {
                message: "authentication failed".into(),
            },
        ];

        for ev in events {
            let mut buf = BytesMut::new();
            codec.encode(ev.clone(), &mut buf).unwrap();
            let decoded = client_codec.decode(&mut buf).unwrap().unwrap();
            assert_eq!(format!("{:?}", ev), format!("{:?}", decoded));
        }
    }

    #[test]
    fn test_multiple_events_in_buffer() {
        let mut codec = ServerCodec::new();
        let mut client_codec = ClientCodec::new();

        let ev1 = ServerEvent::RecentMessages(vec![]);
        let ev2 = ServerEvent::OnlineUsers(vec![UserIdentity::new("u1", "Alice")]);
        let ev3 = ServerEvent::NewMessage(ChatMessage::user("u1", "Alice", "hi", 1));

        let mut buf = BytesMut::new();
        codec.encode(ev1.clone(), &mut buf).unwrap();
        codec.encode(ev2.clone(), &mut buf).unwrap();
        codec.encode(ev3.clone(), &mut buf).unwrap();

        let decoded1 = client_codec.decode(&mut buf).unwrap().unwrap();
        let decoded2 = client_codec.decode(&mut buf).unwrap().unwrap();
        let decoded3 = client_codec.decode(&mut buf).unwrap().unwrap();

        assert_eq!(format!("{:?}", ev1), format!("{:?}", decoded1));
        assert_eq!(format!("{:?}", ev2), format!("{:?}", decoded2));
        assert_eq!(format!("{:?}", ev3), format!("{:?}", decoded3));

        // Buffer should be empty now
        assert!(client_codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_garbage_frame_is_an_error() {
        let mut client_codec = ClientCodec::new();

        let mut buf = BytesMut::new();
        buf.put_u32(9);
        buf.put_slice(b"not json!");

        let result = client_codec.decode(&mut buf);
        assert!(matches!(result, Err(CodecError::Json(_))));
    }
}
