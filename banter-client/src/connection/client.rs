//! Connection handle and I/O task

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

use banter_protocol::{ClientCodec, ClientEvent, CodecError, ServerEvent};

use super::handler::EventSender;

/// Identity of one transport connection within a session manager.
///
/// Monotonically increasing; the controller ignores signals whose id does
/// not match the connection it currently owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Lifecycle signal or decoded event from one connection's I/O task
#[derive(Debug)]
pub enum ConnSignal {
    /// Transport established; the handshake may now run
    Connected,
    /// One decoded inbound event
    Event(ServerEvent),
    /// Connect failure, send failure, or framing desync. A malformed
    /// payload inside an intact frame is not fatal and never surfaces
    /// here; the event is logged and skipped.
    TransportError(String),
    /// Server closed the stream
    Disconnected,
}

/// A signal tagged with the connection it came from
#[derive(Debug)]
pub struct ConnectionEvent {
    pub conn: ConnectionId,
    pub signal: ConnSignal,
}

/// One live transport connection, owned by the session controller
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::Sender<ClientEvent>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl Connection {
    /// Open a connection to `addr` (host:port).
    ///
    /// Returns immediately; the spawned task dials the server and reports
    /// `Connected` or `TransportError` through `signals`. There is no
    /// automatic retry or reconnection.
    pub fn open(id: ConnectionId, addr: String, signals: mpsc::Sender<ConnectionEvent>) -> Self {
        let (tx, rx) = mpsc::channel::<ClientEvent>(100);
        let task = tokio::spawn(connection_task(id, addr, rx, signals));
        Self {
            id,
            tx,
            task: Some(task),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get a clonable sender for outgoing events
    pub fn sender(&self) -> EventSender {
        EventSender::new(self.tx.clone())
    }

    /// Close the connection. Idempotent; closing an already-closed
    /// connection is a no-op.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            tracing::debug!(conn = %self.id, "Closing connection");
            task.abort();
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Background task that owns the socket I/O for one connection
async fn connection_task(
    id: ConnectionId,
    addr: String,
    mut outgoing: mpsc::Receiver<ClientEvent>,
    signals: mpsc::Sender<ConnectionEvent>,
) {
    let emit = |signal: ConnSignal| {
        let signals = signals.clone();
        async move {
            // Receiver dropped means the controller is gone; nothing to do
            let _ = signals.send(ConnectionEvent { conn: id, signal }).await;
        }
    };

    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::debug!(conn = %id, %addr, "Connect failed: {}", e);
            emit(ConnSignal::TransportError(format!(
                "Failed to connect to {}: {}",
                addr, e
            )))
            .await;
            return;
        }
    };

    tracing::debug!(conn = %id, %addr, "Transport connected");
    emit(ConnSignal::Connected).await;

    let mut framed = Framed::new(stream, ClientCodec::new());

    loop {
        tokio::select! {
            // Outgoing events
            Some(event) = outgoing.recv() => {
                if let Err(e) = framed.send(event).await {
                    tracing::error!(conn = %id, "Failed to send event: {}", e);
                    emit(ConnSignal::TransportError(format!("Send failed: {}", e))).await;
                    break;
                }
            }

            // Inbound events
            result = framed.next() => {
                match result {
                    Some(Ok(event)) => {
                        tracing::trace!(conn = %id, ?event, "Received event");
                        emit(ConnSignal::Event(event)).await;
                    }
                    Some(Err(CodecError::Json(e))) => {
                        // The frame was complete, only its payload was
                        // unparseable; framing stays in sync, so skip the
                        // event and keep reading
                        tracing::warn!(conn = %id, "Ignoring malformed event: {}", e);
                    }
                    Some(Err(e)) => {
                        tracing::error!(conn = %id, "Failed to decode event: {}", e);
                        emit(ConnSignal::TransportError(format!("Receive failed: {}", e))).await;
                        break;
                    }
                    None => {
                        tracing::info!(conn = %id, "Server closed connection");
                        emit(ConnSignal::Disconnected).await;
                        break;
                    }
                }
            }
        }
    }
}
