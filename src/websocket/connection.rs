use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::WebSocketError;
use crate::websocket::{ConnectionRegistry, QueueSender, RelayMessage};

pub type ConnectionId = Uuid;

/// Outbound half of an upgraded client stream.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, text: String) -> Result<(), WebSocketError>;

    async fn pong(&mut self, payload: Vec<u8>) -> Result<(), WebSocketError>;

    /// Must tolerate being called more than once.
    async fn close(&mut self);
}

/// Inbound frame, already separated from the transport's own types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong,
    Close,
}

/// A live client. The read loop owns the inbound stream; this struct holds
/// the outbound side that the registry shares with the broadcast loop.
pub struct Connection {
    id: ConnectionId,
    peer_addr: String,
    sink: Mutex<Box<dyn FrameSink>>,
}

impl Connection {
    pub fn new(peer_addr: impl Into<String>, sink: impl FrameSink + 'static) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            peer_addr: peer_addr.into(),
            sink: Mutex::new(Box::new(sink)),
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    pub async fn send_text(&self, text: String) -> Result<(), WebSocketError> {
        self.sink.lock().await.send_text(text).await
    }

    pub async fn pong(&self, payload: Vec<u8>) -> Result<(), WebSocketError> {
        self.sink.lock().await.pong(payload).await
    }

    pub async fn close(&self) {
        self.sink.lock().await.close().await;
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .finish()
    }
}

/// Reads frames from one client and feeds them to the broadcast queue until
/// the client goes away or sends something that does not decode.
///
/// Every exit path deregisters and closes the connection, so the registry
/// never keeps a connection whose reader is gone.
pub async fn read_loop<S>(
    connection: Arc<Connection>,
    frames: S,
    queue: QueueSender,
    registry: Arc<ConnectionRegistry>,
) where
    S: Stream<Item = Result<InboundFrame, WebSocketError>> + Unpin,
{
    let outcome = pump(&connection, frames, &queue).await;

    registry.deregister(&connection.id()).await;
    connection.close().await;

    match outcome {
        Ok(()) => info!(
            "Connection {} from {} closed by client",
            connection.id(),
            connection.peer_addr()
        ),
        Err(e) => warn!(
            "Connection {} from {} terminated: {}",
            connection.id(),
            connection.peer_addr(),
            e
        ),
    }
}

async fn pump<S>(connection: &Connection, mut frames: S, queue: &QueueSender) -> Result<(), WebSocketError>
where
    S: Stream<Item = Result<InboundFrame, WebSocketError>> + Unpin,
{
    while let Some(frame) = frames.next().await {
        let message = match frame? {
            InboundFrame::Text(text) => RelayMessage::decode(text.as_bytes())?,
            InboundFrame::Binary(bytes) => RelayMessage::decode(&bytes)?,
            InboundFrame::Ping(payload) => {
                connection.pong(payload).await?;
                continue;
            }
            InboundFrame::Close => return Ok(()),
            InboundFrame::Pong => continue,
        };

        debug!("Received message from {}: {:?}", connection.peer_addr(), message);
        queue.enqueue(message).await?;
    }

    Ok(())
}
