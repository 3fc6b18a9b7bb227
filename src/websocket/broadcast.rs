use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::WebSocketError;
use crate::websocket::{ConnectionId, ConnectionRegistry, RelayMessage};

/// Creates the shared inbound queue. A capacity of 0 gives an unbounded
/// queue; otherwise producers wait until the broadcast loop frees a slot.
pub fn broadcast_queue(capacity: usize) -> (QueueSender, QueueReceiver) {
    if capacity == 0 {
        let (tx, rx) = mpsc::unbounded_channel();
        (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
    } else {
        let (tx, rx) = mpsc::channel(capacity);
        (QueueSender::Bounded(tx), QueueReceiver::Bounded(rx))
    }
}

#[derive(Debug, Clone)]
pub enum QueueSender {
    Unbounded(mpsc::UnboundedSender<RelayMessage>),
    Bounded(mpsc::Sender<RelayMessage>),
}

impl QueueSender {
    pub async fn enqueue(&self, message: RelayMessage) -> Result<(), WebSocketError> {
        match self {
            QueueSender::Unbounded(tx) => tx.send(message).map_err(|_| WebSocketError::QueueClosed),
            QueueSender::Bounded(tx) => tx.send(message).await.map_err(|_| WebSocketError::QueueClosed),
        }
    }
}

#[derive(Debug)]
pub enum QueueReceiver {
    Unbounded(mpsc::UnboundedReceiver<RelayMessage>),
    Bounded(mpsc::Receiver<RelayMessage>),
}

impl QueueReceiver {
    pub async fn recv(&mut self) -> Option<RelayMessage> {
        match self {
            QueueReceiver::Unbounded(rx) => rx.recv().await,
            QueueReceiver::Bounded(rx) => rx.recv().await,
        }
    }

    pub fn try_recv(&mut self) -> Option<RelayMessage> {
        match self {
            QueueReceiver::Unbounded(rx) => rx.try_recv().ok(),
            QueueReceiver::Bounded(rx) => rx.try_recv().ok(),
        }
    }
}

/// Outcome of delivering one message to the registry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RoundReport {
    pub delivered: usize,
    pub evicted: Vec<ConnectionId>,
}

/// The single consumer of the broadcast queue and the only writer of
/// relayed frames to clients.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    queue: QueueReceiver,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>, queue: QueueReceiver) -> Self {
        Self { registry, queue }
    }

    /// Runs until every queue sender is dropped, which in the server means
    /// for the life of the process.
    pub async fn run(mut self) {
        info!("Broadcast loop started");
        while let Some(message) = self.queue.recv().await {
            self.broadcast_round(&message).await;
        }
        info!("Broadcast queue closed, broadcast loop exiting");
    }

    /// Sends `message` to every registered connection, the sender included.
    /// A failed write closes and evicts that target and the round carries on.
    pub async fn broadcast_round(&self, message: &RelayMessage) -> RoundReport {
        let mut report = RoundReport::default();

        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                error!("Dropping message that failed to encode: {}", e);
                return report;
            }
        };

        let targets = self.registry.snapshot().await;
        debug!("Broadcasting message {:?} to {} connections", message, targets.len());

        for connection in targets {
            debug!("Sending to client: {}", connection.peer_addr());
            match connection.send_text(text.clone()).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(
                        "Error writing message to connection {} ({}): {}",
                        connection.id(),
                        connection.peer_addr(),
                        e
                    );
                    connection.close().await;
                    self.registry.deregister(&connection.id()).await;
                    report.evicted.push(connection.id());
                }
            }
        }

        report
    }
}
