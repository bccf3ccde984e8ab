//! WebSocket connection trait abstraction.
//!
//! Provides a trait-based abstraction for WebSocket operations, so a
//! [`WhatsAppSession`](crate::session::WhatsAppSession) can run against the
//! real transport or a mock.

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use crate::websocket::messages::{WsIncomingMessage, WsOutgoingMessage};
use crate::websocket::{WsConnectionState, WsError};

/// Trait for WebSocket connection operations.
///
/// Incoming messages are distributed through a broadcast channel and the
/// connection phase through a watch channel.
///
/// # Example
///
/// ```ignore
/// use ferraco_whatsapp::traits::WebSocketConnection;
/// use ferraco_whatsapp::websocket::WsOutgoingMessage;
///
/// async fn follow<C: WebSocketConnection>(conn: &C) -> Result<(), WsError> {
///     let mut rx = conn.subscribe();
///     conn.send(WsOutgoingMessage::subscribe("conv-1")).await?;
///     while let Ok(msg) = rx.recv().await {
///         println!("{}", msg.event_name());
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait WebSocketConnection: Send + Sync {
    /// Send a message to the server.
    async fn send(&self, msg: WsOutgoingMessage) -> Result<(), WsError>;

    /// Subscribe to incoming messages.
    ///
    /// Only messages received after the call are delivered, except that a
    /// connection may hold frames that arrived before its first subscriber
    /// and hand them to it.
    fn subscribe(&self) -> broadcast::Receiver<WsIncomingMessage>;

    /// Get a receiver for connection state changes.
    fn state(&self) -> watch::Receiver<WsConnectionState>;

    /// Check if the transport is currently connected.
    fn is_connected(&self) -> bool {
        matches!(*self.state().borrow(), WsConnectionState::Connected)
    }

    /// Close the connection and stop reconnecting.
    fn shutdown(&self);
}
