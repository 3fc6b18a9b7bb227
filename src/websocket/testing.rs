use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::WebSocketError;
use crate::websocket::FrameSink;

/// In-memory client used by unit tests. Clones share state, so a test can
/// keep one handle while the registry owns another.
#[derive(Clone, Default)]
pub struct RecordingSink {
    frames: Arc<Mutex<Vec<String>>>,
    pongs: Arc<Mutex<Vec<Vec<u8>>>>,
    failing: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn heal_writes(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }

    pub fn pongs(&self) -> Vec<Vec<u8>> {
        self.pongs.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameSink for RecordingSink {
    async fn send_text(&mut self, text: String) -> Result<(), WebSocketError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(WebSocketError::SendError("induced write failure".to_string()));
        }
        self.frames.lock().unwrap().push(text);
        Ok(())
    }

    async fn pong(&mut self, payload: Vec<u8>) -> Result<(), WebSocketError> {
        self.pongs.lock().unwrap().push(payload);
        Ok(())
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
