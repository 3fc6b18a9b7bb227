use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::websocket::{Connection, ConnectionId};

/// The set of connections eligible for broadcast.
///
/// Read loops insert and remove their own connection; the broadcast loop
/// removes connections it failed to write to. Broadcast rounds iterate a
/// snapshot, so no lock is held while a send is in flight.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection: Arc<Connection>) {
        let id = connection.id();
        let peer_addr = connection.peer_addr().to_string();
        self.connections.write().await.insert(id, connection);
        info!("Registered connection {} from {}", id, peer_addr);
    }

    pub async fn deregister(&self, id: &ConnectionId) -> Option<Arc<Connection>> {
        let removed = self.connections.write().await.remove(id);
        if removed.is_some() {
            info!("Deregistered connection {}", id);
        }
        removed
    }

    pub async fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Sorted peer addresses, for diagnostics.
    pub async fn peer_addrs(&self) -> Vec<String> {
        let mut addrs: Vec<String> = self
            .connections
            .read()
            .await
            .values()
            .map(|connection| connection.peer_addr().to_string())
            .collect();
        addrs.sort();
        addrs
    }
}
