use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Notify};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::messages::{WsIncomingMessage, WsOutgoingMessage};
use crate::error::ConfigError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// WebSocket connection errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Disconnected from server")]
    Disconnected,
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// WebSocket connection state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsConnectionState {
    Connected,
    Reconnecting { attempt: u8 },
    Disconnected,
}

/// Configuration for WebSocket client
#[derive(Debug, Clone, PartialEq)]
pub struct WsClientConfig {
    /// Backend event stream, `ws://` or `wss://`
    pub url: String,
    /// Reconnection attempts after a drop before giving up
    pub max_retries: u8,
    /// Fixed delay before each reconnection attempt
    pub reconnect_delay: Duration,
    /// Sent as the `token` query parameter
    pub auth_token: Option<String>,
}

impl Default for WsClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:3001/ws/whatsapp".to_string(),
            max_retries: 5,
            reconnect_delay: Duration::from_millis(1000),
            auth_token: None,
        }
    }
}

impl WsClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Build a config from `FERRACO_WS_*` environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("FERRACO_WS_URL") {
            config.url = url;
        }
        if let Some(token) = lookup("FERRACO_WS_TOKEN").filter(|t| !t.is_empty()) {
            config.auth_token = Some(token);
        }
        if let Some(raw) = lookup("FERRACO_WS_MAX_RETRIES") {
            config.max_retries = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: "FERRACO_WS_MAX_RETRIES",
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup("FERRACO_WS_RECONNECT_DELAY_MS") {
            let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: "FERRACO_WS_RECONNECT_DELAY_MS",
                value: raw.clone(),
            })?;
            config.reconnect_delay = Duration::from_millis(millis);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.starts_with("ws://") || self.url.starts_with("wss://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidUrl {
                url: self.url.clone(),
            })
        }
    }

    /// URL actually dialed, with the auth token appended.
    pub fn connect_url(&self) -> String {
        match &self.auth_token {
            Some(token) => {
                let separator = if self.url.contains('?') { '&' } else { '?' };
                format!(
                    "{}{}token={}",
                    self.url,
                    separator,
                    urlencoding::encode(token)
                )
            }
            None => self.url.clone(),
        }
    }
}

/// Stops the connection loop, including while it waits on the socket or
/// sleeps between reconnection attempts.
#[derive(Debug, Default)]
struct ShutdownSignal {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownSignal {
    fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    fn is_triggered(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// WebSocket client for the backend's WhatsApp event stream
pub struct WsClient {
    /// Channel feeding the connection task's sink
    outgoing_tx: mpsc::Sender<WsOutgoingMessage>,
    /// Decoded messages from the server; `None` once taken
    incoming_rx: Option<mpsc::Receiver<WsIncomingMessage>>,
    state_rx: watch::Receiver<WsConnectionState>,
    shutdown: Arc<ShutdownSignal>,
}

impl WsClient {
    /// Connect to the WebSocket server
    ///
    /// Returns a WsClient on success, or WsError if initial connection fails
    pub async fn connect(config: WsClientConfig) -> Result<Self, WsError> {
        config
            .validate()
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
        let url = config.connect_url();

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        info!("Connected to WebSocket server at {}", config.url);

        let (ws_sink, ws_source) = ws_stream.split();

        let (incoming_tx, incoming_rx) = mpsc::channel::<WsIncomingMessage>(100);
        let (outgoing_tx, outgoing_rx) = mpsc::channel::<WsOutgoingMessage>(100);
        let (state_tx, state_rx) = watch::channel(WsConnectionState::Connected);

        let shutdown = Arc::new(ShutdownSignal::default());

        tokio::spawn(run_connection_loop(
            url,
            config,
            ws_sink,
            ws_source,
            incoming_tx,
            outgoing_rx,
            state_tx,
            shutdown.clone(),
        ));

        Ok(Self {
            outgoing_tx,
            incoming_rx: Some(incoming_rx),
            state_rx,
            shutdown,
        })
    }

    /// Check if currently connected
    pub fn is_connected(&self) -> bool {
        matches!(*self.state_rx.borrow(), WsConnectionState::Connected)
    }

    pub fn connection_state(&self) -> WsConnectionState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to connection state changes
    pub fn state_receiver(&self) -> watch::Receiver<WsConnectionState> {
        self.state_rx.clone()
    }

    /// Queue a message for the server.
    pub async fn send(&self, message: WsOutgoingMessage) -> Result<(), WsError> {
        if !self.is_connected() {
            return Err(WsError::Disconnected);
        }
        self.outgoing_tx
            .send(message)
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))
    }

    /// Receive the next incoming message
    ///
    /// Returns `None` when the connection task has ended or the receiver was
    /// taken with [`take_incoming`](Self::take_incoming).
    pub async fn recv(&mut self) -> Option<WsIncomingMessage> {
        match self.incoming_rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Take ownership of the incoming message receiver.
    pub fn take_incoming(&mut self) -> Option<mpsc::Receiver<WsIncomingMessage>> {
        self.incoming_rx.take()
    }

    /// Close the connection and stop reconnecting.
    pub fn shutdown(&self) {
        if !self.shutdown.is_triggered() {
            info!("Shutting down WebSocket client");
        }
        self.shutdown.trigger();
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// What the inner loop should do next after one select round.
enum LoopControl {
    Continue,
    Reconnect,
    Stop,
}

/// Run the main connection loop with reconnection logic
#[allow(clippy::too_many_arguments)]
async fn run_connection_loop(
    url: String,
    config: WsClientConfig,
    mut ws_sink: WsSink,
    mut ws_source: WsSource,
    incoming_tx: mpsc::Sender<WsIncomingMessage>,
    mut outgoing_rx: mpsc::Receiver<WsOutgoingMessage>,
    state_tx: watch::Sender<WsConnectionState>,
    shutdown: Arc<ShutdownSignal>,
) {
    loop {
        if shutdown.is_triggered() {
            debug!("Shutdown signal received, closing connection");
            let _ = ws_sink.close().await;
            break;
        }

        let control = tokio::select! {
            _ = shutdown.notify.notified() => LoopControl::Continue,

            msg = ws_source.next() => {
                handle_frame(msg, &incoming_tx).await
            }

            outgoing = outgoing_rx.recv() => match outgoing {
                Some(message) => {
                    match serde_json::to_string(&message) {
                        Ok(json) => {
                            debug!("Sending message: {}", json);
                            if let Err(e) = ws_sink.send(Message::Text(json)).await {
                                error!("Failed to send message: {}", e);
                            }
                        }
                        Err(e) => error!("Failed to serialize message: {}", e),
                    }
                    LoopControl::Continue
                }
                None => {
                    debug!("Outgoing channel closed, shutting down");
                    LoopControl::Stop
                }
            },
        };

        match control {
            LoopControl::Continue => {}
            LoopControl::Stop => {
                let _ = ws_sink.close().await;
                break;
            }
            LoopControl::Reconnect => {
                match attempt_reconnect(&url, &config, &state_tx, &shutdown).await {
                    Some((new_sink, new_source)) => {
                        ws_sink = new_sink;
                        ws_source = new_source;
                        let _ = state_tx.send(WsConnectionState::Connected);
                    }
                    None => break,
                }
            }
        }
    }

    info!("Connection loop ended");
    let _ = state_tx.send(WsConnectionState::Disconnected);
}

async fn handle_frame(
    msg: Option<Result<Message, tokio_tungstenite::tungstenite::Error>>,
    incoming_tx: &mpsc::Sender<WsIncomingMessage>,
) -> LoopControl {
    match msg {
        Some(Ok(Message::Text(text))) => {
            match WsIncomingMessage::parse(&text) {
                Ok(parsed) => {
                    debug!(event = parsed.event_name(), "Received message");
                    if incoming_tx.send(parsed).await.is_err() {
                        warn!("Incoming channel closed, shutting down");
                        return LoopControl::Stop;
                    }
                }
                Err(e) => {
                    // Skip malformed frames
                    warn!(frame = %text, "{}", e);
                }
            }
            LoopControl::Continue
        }
        Some(Ok(Message::Close(_))) => {
            info!("Received close frame from server");
            LoopControl::Reconnect
        }
        // Pings are answered by tungstenite itself
        Some(Ok(_)) => LoopControl::Continue,
        Some(Err(e)) => {
            error!("WebSocket error: {}", e);
            LoopControl::Reconnect
        }
        None => {
            info!("WebSocket stream ended");
            LoopControl::Reconnect
        }
    }
}

/// Attempt to reconnect, waiting a fixed delay before each attempt
async fn attempt_reconnect(
    url: &str,
    config: &WsClientConfig,
    state_tx: &watch::Sender<WsConnectionState>,
    shutdown: &ShutdownSignal,
) -> Option<(WsSink, WsSource)> {
    for attempt in 1..=config.max_retries {
        if shutdown.is_triggered() {
            debug!("Shutdown requested during reconnection");
            return None;
        }

        let _ = state_tx.send(WsConnectionState::Reconnecting { attempt });

        info!(
            "Reconnection attempt {} of {}, waiting {}ms",
            attempt,
            config.max_retries,
            config.reconnect_delay.as_millis()
        );

        tokio::select! {
            _ = tokio::time::sleep(config.reconnect_delay) => {}
            _ = shutdown.notify.notified() => {
                debug!("Shutdown requested during backoff");
                return None;
            }
        }

        match connect_async(url).await {
            Ok((ws_stream, _)) => {
                info!("Reconnected successfully on attempt {}", attempt);
                return Some(ws_stream.split());
            }
            Err(e) => {
                warn!("Reconnection attempt {} failed: {}", attempt, e);
            }
        }
    }

    error!(
        "Failed to reconnect after {} attempts, giving up",
        config.max_retries
    );
    None
}
