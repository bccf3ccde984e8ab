//! Tungstenite-based WebSocket adapter.
//!
//! This module provides a WebSocket connection implementation that wraps
//! [`WsClient`] and implements the [`WebSocketConnection`] trait.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::traits::WebSocketConnection;
use crate::websocket::messages::{WsIncomingMessage, WsOutgoingMessage};
use crate::websocket::{WsClient, WsClientConfig, WsConnectionState, WsError};

/// WebSocket connection adapter using tokio-tungstenite.
///
/// # Example
///
/// ```ignore
/// use ferraco_whatsapp::adapters::TungsteniteWsConnection;
/// use ferraco_whatsapp::traits::WebSocketConnection;
/// use ferraco_whatsapp::websocket::WsClientConfig;
///
/// let connection = TungsteniteWsConnection::connect(WsClientConfig::default()).await?;
/// let mut rx = connection.subscribe();
/// ```
pub struct TungsteniteWsConnection {
    client: WsClient,
    /// Broadcast sender for incoming messages
    incoming_tx: broadcast::Sender<WsIncomingMessage>,
    /// Receiver created with the channel. It buffers frames that arrive
    /// before anyone subscribes and is handed to the first subscriber.
    first_rx: Mutex<Option<broadcast::Receiver<WsIncomingMessage>>>,
    /// Moves messages from the client's queue onto the broadcast channel
    forwarder: JoinHandle<()>,
}

impl TungsteniteWsConnection {
    /// Connect to a WebSocket server using the provided configuration.
    pub async fn connect(config: WsClientConfig) -> Result<Self, WsError> {
        let mut client = WsClient::connect(config).await?;
        let mut incoming_rx = client.take_incoming().ok_or(WsError::Disconnected)?;

        let (incoming_tx, first_rx) = broadcast::channel(100);
        let incoming_tx_clone = incoming_tx.clone();

        let forwarder = tokio::spawn(async move {
            while let Some(msg) = incoming_rx.recv().await {
                // No subscribers is not an error
                let _ = incoming_tx_clone.send(msg);
            }
            debug!("WebSocket forwarder finished");
        });

        Ok(Self {
            client,
            incoming_tx,
            first_rx: Mutex::new(Some(first_rx)),
            forwarder,
        })
    }
}

#[async_trait]
impl WebSocketConnection for TungsteniteWsConnection {
    async fn send(&self, msg: WsOutgoingMessage) -> Result<(), WsError> {
        self.client.send(msg).await
    }

    fn subscribe(&self) -> broadcast::Receiver<WsIncomingMessage> {
        self.first_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_else(|| self.incoming_tx.subscribe())
    }

    fn state(&self) -> watch::Receiver<WsConnectionState> {
        self.client.state_receiver()
    }

    fn shutdown(&self) {
        self.client.shutdown();
        self.forwarder.abort();
    }
}

impl Drop for TungsteniteWsConnection {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}
