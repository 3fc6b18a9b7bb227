//! WebSocket relay core
//!
//! Connections register on upgrade, their read loops push decoded messages
//! onto one shared queue, and a single broadcast loop fans each message out
//! to every registered connection.

mod broadcast;
mod connection;
mod message;
mod registry;
mod server;

#[cfg(test)]
pub(crate) mod testing;

pub use broadcast::{broadcast_queue, Broadcaster, QueueReceiver, QueueSender, RoundReport};
pub use connection::{read_loop, Connection, ConnectionId, FrameSink, InboundFrame};
pub use message::RelayMessage;
pub use registry::ConnectionRegistry;
pub use server::{websocket_route, SessionSink};
