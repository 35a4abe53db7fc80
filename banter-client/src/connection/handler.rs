//! Outgoing event handle

use banter_protocol::ClientEvent;
use banter_utils::{BanterError, Result};
use tokio::sync::mpsc;

/// Clonable sender for outgoing events on one connection
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<ClientEvent>,
}

impl EventSender {
    pub fn new(tx: mpsc::Sender<ClientEvent>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, event: ClientEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| BanterError::ConnectionClosed)?;
        Ok(())
    }

    /// Send without waiting (fire and forget)
    pub fn send_nowait(&self, event: ClientEvent) {
        if self.tx.try_send(event).is_err() {
            tracing::debug!("Outgoing event dropped, connection gone or backed up");
        }
    }
}
