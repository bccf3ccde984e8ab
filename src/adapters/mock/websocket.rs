//! Scriptable stand-in for the backend's WhatsApp event stream.
//!
//! Tests push bridge frames in, read back what the session sent, and move
//! the transport through its reconnect phases by hand.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use crate::domain::Account;
use crate::traits::WebSocketConnection;
use crate::websocket::messages::{
    WsChatMessage, WsIncomingMessage, WsOutgoingMessage, WsQrCode, WsStatus,
};
use crate::websocket::{WsConnectionState, WsError};

struct Shared {
    frames: broadcast::Sender<WsIncomingMessage>,
    phase: watch::Sender<WsConnectionState>,
    sent: Mutex<Vec<WsOutgoingMessage>>,
    fail_sends: AtomicBool,
}

/// In-memory [`WebSocketConnection`].
///
/// Clones share one stream, so a test keeps a clone while the session owns
/// the other.
///
/// ```ignore
/// let mock = MockWebSocket::new();
/// let session = WhatsAppSession::open(mock.clone(), SessionCallbacks::default());
/// mock.push_qr("data:image/png;base64,...", 1);
/// ```
#[derive(Clone)]
pub struct MockWebSocket {
    shared: Arc<Shared>,
}

impl MockWebSocket {
    /// A transport that is already connected.
    pub fn new() -> Self {
        Self::in_phase(WsConnectionState::Connected)
    }

    /// A transport that has already given up.
    pub fn disconnected() -> Self {
        Self::in_phase(WsConnectionState::Disconnected)
    }

    fn in_phase(phase: WsConnectionState) -> Self {
        let (frames, _) = broadcast::channel(100);
        let (phase, _) = watch::channel(phase);

        Self {
            shared: Arc::new(Shared {
                frames,
                phase,
                sent: Mutex::new(Vec::new()),
                fail_sends: AtomicBool::new(false),
            }),
        }
    }

    /// Deliver a frame to every current listener.
    pub fn push(&self, msg: WsIncomingMessage) {
        // Nobody listening yet is fine
        let _ = self.shared.frames.send(msg);
    }

    pub fn push_all(&self, msgs: impl IntoIterator<Item = WsIncomingMessage>) {
        for msg in msgs {
            self.push(msg);
        }
    }

    pub fn push_qr(&self, qr_code: &str, attempt: u32) {
        self.push(WsIncomingMessage::Qr(WsQrCode {
            qr_code: qr_code.to_string(),
            attempt,
        }));
    }

    /// Push a raw bridge status such as `qrReadSuccess`.
    pub fn push_status(&self, raw: &str) {
        self.push(WsIncomingMessage::Status(WsStatus {
            status: raw.to_string(),
        }));
    }

    pub fn push_ready(&self, account: Account) {
        self.push(WsIncomingMessage::Ready(account));
    }

    pub fn push_chat(&self, conversation_id: &str, id: &str, body: &str) {
        self.push(WsIncomingMessage::NewMessage(WsChatMessage {
            id: id.to_string(),
            conversation_id: conversation_id.to_string(),
            body: body.to_string(),
            from_me: false,
            kind: None,
            timestamp: None,
        }));
    }

    pub fn set_phase(&self, phase: WsConnectionState) {
        self.shared.phase.send_replace(phase);
    }

    /// Socket lost; the client is on reconnect `attempt`.
    pub fn drop_connection(&self, attempt: u8) {
        self.set_phase(WsConnectionState::Reconnecting { attempt });
    }

    pub fn restore_connection(&self) {
        self.set_phase(WsConnectionState::Connected);
    }

    /// The client ran out of reconnect attempts.
    pub fn exhaust_retries(&self) {
        self.set_phase(WsConnectionState::Disconnected);
    }

    /// Everything sent so far, oldest first.
    pub fn sent(&self) -> Vec<WsOutgoingMessage> {
        self.sent_log().clone()
    }

    /// Drain the sent log.
    pub fn take_sent(&self) -> Vec<WsOutgoingMessage> {
        std::mem::take(&mut *self.sent_log())
    }

    /// Conversations the server would consider subscribed, replaying the
    /// sent log.
    pub fn subscribed_conversations(&self) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        for msg in self.sent_log().iter() {
            match msg {
                WsOutgoingMessage::SubscribeConversation(r) => {
                    ids.insert(r.conversation_id.clone());
                }
                WsOutgoingMessage::UnsubscribeConversation(r) => {
                    ids.remove(&r.conversation_id);
                }
            }
        }
        ids
    }

    /// Make every following `send` fail.
    pub fn fail_sends(&self, fail: bool) {
        self.shared.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn listener_count(&self) -> usize {
        self.shared.frames.receiver_count()
    }

    fn sent_log(&self) -> std::sync::MutexGuard<'_, Vec<WsOutgoingMessage>> {
        self.shared
            .sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebSocketConnection for MockWebSocket {
    async fn send(&self, msg: WsOutgoingMessage) -> Result<(), WsError> {
        if self.shared.fail_sends.load(Ordering::SeqCst) {
            return Err(WsError::SendFailed("mock send failure".to_string()));
        }
        self.sent_log().push(msg);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<WsIncomingMessage> {
        self.shared.frames.subscribe()
    }

    fn state(&self) -> watch::Receiver<WsConnectionState> {
        self.shared.phase.subscribe()
    }

    fn shutdown(&self) {
        self.exhaust_retries();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_phase() {
        assert!(MockWebSocket::new().is_connected());
        assert!(!MockWebSocket::disconnected().is_connected());
    }

    #[tokio::test]
    async fn test_push_keeps_order() {
        let mock = MockWebSocket::new();
        let mut rx = mock.subscribe();

        mock.push_status("initBrowser");
        mock.push_qr("abc", 2);

        assert_eq!(rx.recv().await.unwrap().event_name(), "whatsapp:status");
        match rx.recv().await.unwrap() {
            WsIncomingMessage::Qr(qr) => assert_eq!(qr.attempt, 2),
            other => panic!("Expected Qr, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sent_log_and_subscriptions() {
        let mock = MockWebSocket::new();

        mock.send(WsOutgoingMessage::subscribe("conv-1")).await.unwrap();
        mock.send(WsOutgoingMessage::subscribe("conv-2")).await.unwrap();
        mock.send(WsOutgoingMessage::unsubscribe("conv-1")).await.unwrap();

        assert_eq!(mock.sent().len(), 3);
        assert_eq!(
            mock.subscribed_conversations().into_iter().collect::<Vec<_>>(),
            vec!["conv-2".to_string()]
        );

        assert_eq!(mock.take_sent().len(), 3);
        assert!(mock.sent().is_empty());
    }

    #[tokio::test]
    async fn test_fail_sends() {
        let mock = MockWebSocket::new();
        mock.fail_sends(true);

        let result = mock.send(WsOutgoingMessage::subscribe("conv-1")).await;
        assert!(matches!(result, Err(WsError::SendFailed(_))));
        assert!(mock.sent().is_empty());
    }

    #[test]
    fn test_phase_changes_reach_existing_receivers() {
        let mock = MockWebSocket::new();
        let rx = mock.state();

        mock.drop_connection(1);
        assert_eq!(*rx.borrow(), WsConnectionState::Reconnecting { attempt: 1 });

        mock.restore_connection();
        assert!(mock.is_connected());

        mock.shutdown();
        assert_eq!(*rx.borrow(), WsConnectionState::Disconnected);
    }

    #[test]
    fn test_clones_share_listeners() {
        let mock = MockWebSocket::new();
        assert_eq!(mock.listener_count(), 0);

        let _rx = mock.clone().subscribe();
        assert_eq!(mock.listener_count(), 1);
    }
}
