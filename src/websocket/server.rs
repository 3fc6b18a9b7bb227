use actix_web::{web, HttpRequest, HttpResponse};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{error, info};

use crate::error::{AppError, WebSocketError};
use crate::websocket::{read_loop, Connection, FrameSink, InboundFrame};
use crate::AppState;

/// Outbound half of an actix-ws session.
pub struct SessionSink {
    session: Option<actix_ws::Session>,
}

impl SessionSink {
    pub fn new(session: actix_ws::Session) -> Self {
        Self { session: Some(session) }
    }

    fn session(&mut self) -> Result<&mut actix_ws::Session, WebSocketError> {
        self.session
            .as_mut()
            .ok_or_else(|| WebSocketError::SendError("session already closed".to_string()))
    }
}

#[async_trait]
impl FrameSink for SessionSink {
    async fn send_text(&mut self, text: String) -> Result<(), WebSocketError> {
        self.session()?
            .text(text)
            .await
            .map_err(|_| WebSocketError::SendError("session closed".to_string()))
    }

    async fn pong(&mut self, payload: Vec<u8>) -> Result<(), WebSocketError> {
        self.session()?
            .pong(&payload)
            .await
            .map_err(|_| WebSocketError::SendError("session closed".to_string()))
    }

    async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            // Already-closed sessions report an error here; nothing left to do.
            let _ = session.close(None).await;
        }
    }
}

fn inbound_frame(msg: Result<actix_ws::AggregatedMessage, actix_ws::ProtocolError>) -> Result<InboundFrame, WebSocketError> {
    match msg {
        Ok(actix_ws::AggregatedMessage::Text(text)) => Ok(InboundFrame::Text(text.to_string())),
        Ok(actix_ws::AggregatedMessage::Binary(bytes)) => Ok(InboundFrame::Binary(bytes.to_vec())),
        Ok(actix_ws::AggregatedMessage::Ping(bytes)) => Ok(InboundFrame::Ping(bytes.to_vec())),
        Ok(actix_ws::AggregatedMessage::Pong(_)) => Ok(InboundFrame::Pong),
        Ok(actix_ws::AggregatedMessage::Close(reason)) => {
            info!("Client sent close: {:?}", reason);
            Ok(InboundFrame::Close)
        }
        Err(e) => Err(WebSocketError::ReadFailed(e.to_string())),
    }
}

/// Upgrades the request, registers the connection and starts its read loop.
/// No origin check is made.
pub async fn websocket_route(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let peer_addr = req
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let (response, session, stream) = actix_ws::handle(&req, body).map_err(|e| {
        error!("Error upgrading to WebSocket for {}: {}", peer_addr, e);
        WebSocketError::UpgradeFailed(e.to_string())
    })?;

    let connection = Connection::new(peer_addr, SessionSink::new(session));
    state.registry.register(connection.clone()).await;
    info!("New connection from: {} (id: {})", connection.peer_addr(), connection.id());

    // Fragmented messages are joined before decoding, under the same size cap
    // as single frames. The stream is !Send, so the reader stays on this
    // worker's local set.
    let max_size = state.config.server.max_frame_size;
    let frames = stream
        .max_frame_size(max_size)
        .aggregate_continuations()
        .max_continuation_size(max_size)
        .map(inbound_frame)
        .boxed_local();
    actix_rt::spawn(read_loop(connection, frames, state.queue.clone(), state.registry.clone()));

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web::Bytes;

    #[test]
    fn test_inbound_frame_mapping() {
        let text = inbound_frame(Ok(actix_ws::AggregatedMessage::Text(r#"{"type":"a","data":"b"}"#.into())));
        assert_eq!(text.unwrap(), InboundFrame::Text(r#"{"type":"a","data":"b"}"#.to_string()));

        let binary = inbound_frame(Ok(actix_ws::AggregatedMessage::Binary(Bytes::from_static(b"{}"))));
        assert_eq!(binary.unwrap(), InboundFrame::Binary(b"{}".to_vec()));

        let ping = inbound_frame(Ok(actix_ws::AggregatedMessage::Ping(Bytes::from_static(b"hb"))));
        assert_eq!(ping.unwrap(), InboundFrame::Ping(b"hb".to_vec()));

        let pong = inbound_frame(Ok(actix_ws::AggregatedMessage::Pong(Bytes::new())));
        assert_eq!(pong.unwrap(), InboundFrame::Pong);

        let close = inbound_frame(Ok(actix_ws::AggregatedMessage::Close(None)));
        assert_eq!(close.unwrap(), InboundFrame::Close);
    }

    #[test]
    fn test_protocol_error_is_a_read_failure() {
        match inbound_frame(Err(actix_ws::ProtocolError::Overflow)) {
            Err(WebSocketError::ReadFailed(_)) => (),
            other => panic!("Expected ReadFailed, got {:?}", other),
        }
    }
}
