//! Low-latency in-process broadcast of sync messages
//!
//! Only contexts subscribed at send time receive a message; there is no
//! history. Late joiners cold-read the snapshot store instead.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::message::SyncMessage;

#[derive(Debug, Clone)]
pub struct SyncChannel {
    tx: broadcast::Sender<SyncMessage>,
}

impl SyncChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Send to every current subscriber, returning how many there were
    pub fn publish(&self, message: SyncMessage) -> usize {
        match self.tx.send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("No display contexts listening on sync channel");
                0
            }
        }
    }

    pub fn subscribe(&self) -> SyncReceiver {
        SyncReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

pub struct SyncReceiver {
    rx: broadcast::Receiver<SyncMessage>,
}

impl SyncReceiver {
    /// Next message, or `None` once every sender is gone.
    ///
    /// Lagging drops the oldest messages; since each message is a full
    /// snapshot the next one delivered supersedes anything skipped.
    pub async fn recv(&mut self) -> Option<SyncMessage> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Sync receiver lagged, skipped {} messages", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
