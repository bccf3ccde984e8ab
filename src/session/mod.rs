//! A live WhatsApp session: transport, state machine and callbacks.
//!
//! [`WhatsAppSession`] owns one [`WebSocketConnection`] for its whole
//! lifetime. A dispatch task reads inbound events in delivery order, turns
//! them into [`ConnectionEvent`]s (directly, or through [`map_status`] for raw
//! status strings), applies them with [`transition`], and then invokes the
//! matching consumer callback.
//!
//! Callbacks live in a shared cell that the dispatch task reads on every
//! event, so [`WhatsAppSession::set_callbacks`] swaps them without touching
//! the connection.
//!
//! Each inbound event is handled inside a dispatch gate. Shutdown closes
//! the session and then passes through the gate, so once it returns no
//! callback is running and none will start.

mod callbacks;

pub use callbacks::{Callback, SessionCallbacks};

use std::cell::Cell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::adapters::TungsteniteWsConnection;
use crate::domain::{
    can_reconnect, connection_status_category, map_status, transition, ConnectionEvent,
    ConnectionState, ConnectionStatusCategory,
};
use crate::error::FerracoResult;
use crate::traits::WebSocketConnection;
use crate::websocket::{WsClientConfig, WsConnectionState, WsIncomingMessage, WsOutgoingMessage};

/// Error applied when the transport exhausts its reconnection attempts.
pub const TRANSPORT_LOST: &str = "Conexão com o servidor perdida";

thread_local! {
    /// Address of the session whose gate this thread holds, or 0.
    static DISPATCHING: Cell<usize> = const { Cell::new(0) };
}

/// State shared between the session handle and its dispatch task.
struct SessionShared {
    state_tx: watch::Sender<ConnectionState>,
    callbacks: RwLock<SessionCallbacks>,
    conversations: RwLock<HashSet<String>>,
    closed: AtomicBool,
    /// Held while an inbound event is applied and its callback runs.
    gate: Mutex<()>,
}

/// Proof that the dispatch gate is held on this thread.
struct DispatchScope<'a> {
    _gate: MutexGuard<'a, ()>,
}

impl Drop for DispatchScope<'_> {
    fn drop(&mut self) {
        DISPATCHING.with(|current| current.set(0));
    }
}

impl SessionShared {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn id(&self) -> usize {
        self as *const Self as usize
    }

    /// Take the dispatch gate. `None` once the session is closed.
    fn enter(&self) -> Option<DispatchScope<'_>> {
        let gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_closed() {
            return None;
        }
        DISPATCHING.with(|current| current.set(self.id()));
        Some(DispatchScope { _gate: gate })
    }

    /// Wait until no callback of this session is running. Returns at once
    /// when called from one of its own callbacks.
    fn wait_for_dispatch(&self) {
        if DISPATCHING.with(Cell::get) == self.id() {
            return;
        }
        drop(self.gate.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Run `event` through the reducer. Returns whether the state changed.
    fn apply(&self, event: ConnectionEvent) -> bool {
        self.state_tx.send_if_modified(|state| {
            let next = transition(state.clone(), event);
            if next == *state {
                false
            } else {
                *state = next;
                true
            }
        })
    }

    fn conversations(&self) -> RwLockReadGuard<'_, HashSet<String>> {
        self.conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn conversations_mut(&self) -> RwLockWriteGuard<'_, HashSet<String>> {
        self.conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Invoke one callback, read from the current callback set. Callers
    /// hold the dispatch gate.
    fn notify<T>(
        &self,
        pick: impl FnOnce(&SessionCallbacks) -> Option<Callback<T>>,
        payload: &T,
    ) {
        let callback = {
            let guard = self.callbacks.read().unwrap_or_else(PoisonError::into_inner);
            pick(&guard)
        };
        if let Some(callback) = callback {
            callback(payload);
        }
    }

    fn handle_incoming(&self, msg: WsIncomingMessage) {
        let Some(_scope) = self.enter() else {
            return;
        };

        if let Some(conversation_id) = msg.conversation_id() {
            if !self.conversations().contains(conversation_id) {
                debug!(
                    event = msg.event_name(),
                    conversation_id, "dropping event for unsubscribed conversation"
                );
                return;
            }
        }

        match msg {
            WsIncomingMessage::Qr(qr) => {
                self.apply(ConnectionEvent::qr_received(qr.qr_code.clone(), qr.attempt));
                self.notify(|c| c.on_qr.clone(), &qr);
            }
            WsIncomingMessage::Status(status) => {
                let event = map_status(&status.status, &self.state_tx.borrow());
                if let Some(event) = event {
                    self.apply(event);
                }
                self.notify(|c| c.on_status.clone(), &status.status);
            }
            WsIncomingMessage::Ready(account) => {
                self.apply(ConnectionEvent::connected(account.clone()));
                self.notify(|c| c.on_ready.clone(), &account);
            }
            WsIncomingMessage::Disconnected(disconnected) => {
                self.apply(ConnectionEvent::Disconnected {
                    reason: disconnected.reason.clone(),
                });
                self.notify(|c| c.on_disconnected.clone(), &disconnected.reason);
            }
            WsIncomingMessage::Error(notice) => {
                self.apply(ConnectionEvent::Error {
                    error: notice.message.clone(),
                    recoverable: notice.recoverable,
                });
                self.notify(|c| c.on_error.clone(), &notice.message);
            }
            WsIncomingMessage::NewMessage(m) => self.notify(|c| c.on_message.clone(), &m),
            WsIncomingMessage::MessageStatus(m) => {
                self.notify(|c| c.on_message_status.clone(), &m)
            }
            WsIncomingMessage::ConversationUpdate(m) => {
                self.notify(|c| c.on_conversation_update.clone(), &m)
            }
            WsIncomingMessage::Typing(m) => self.notify(|c| c.on_typing.clone(), &m),
            WsIncomingMessage::Presence(m) => self.notify(|c| c.on_presence.clone(), &m),
            WsIncomingMessage::Reaction(m) => self.notify(|c| c.on_reaction.clone(), &m),
        }
    }

    /// React to a transport phase change. Returns true when conversation
    /// subscriptions must be re-sent.
    fn handle_transport_state(&self, state: WsConnectionState) -> bool {
        match state {
            WsConnectionState::Connected => {
                info!("Transport connected");
                true
            }
            WsConnectionState::Reconnecting { attempt } => {
                warn!(attempt, "Transport lost, reconnecting");
                false
            }
            WsConnectionState::Disconnected => {
                if let Some(_scope) = self.enter() {
                    warn!("Transport gave up reconnecting");
                    self.apply(ConnectionEvent::Error {
                        error: TRANSPORT_LOST.to_string(),
                        recoverable: Some(true),
                    });
                }
                false
            }
        }
    }
}

async fn resubscribe<C: WebSocketConnection>(connection: &C, shared: &SessionShared) {
    let ids: Vec<String> = shared.conversations().iter().cloned().collect();
    for id in ids {
        if let Err(e) = connection.send(WsOutgoingMessage::subscribe(id.as_str())).await {
            warn!(conversation_id = %id, "Failed to resubscribe: {}", e);
        }
    }
}

async fn run_dispatcher<C: WebSocketConnection + 'static>(
    connection: Arc<C>,
    shared: Arc<SessionShared>,
    mut incoming: broadcast::Receiver<WsIncomingMessage>,
    mut transport: watch::Receiver<WsConnectionState>,
) {
    let mut transport_open = true;

    loop {
        tokio::select! {
            msg = incoming.recv() => match msg {
                Ok(msg) => shared.handle_incoming(msg),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session fell behind, inbound events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Incoming channel closed");
                    break;
                }
            },
            changed = transport.changed(), if transport_open => {
                if changed.is_err() {
                    transport_open = false;
                    continue;
                }
                let state = transport.borrow_and_update().clone();
                if shared.handle_transport_state(state) {
                    resubscribe(connection.as_ref(), &shared).await;
                }
            }
        }

        if shared.is_closed() {
            break;
        }
    }

    debug!("Session dispatcher ended");
}

/// One WhatsApp session bound to one transport connection.
///
/// Dropping the session shuts it down.
pub struct WhatsAppSession<C: WebSocketConnection + 'static> {
    connection: Arc<C>,
    shared: Arc<SessionShared>,
    state_rx: watch::Receiver<ConnectionState>,
    dispatcher: JoinHandle<()>,
}

impl WhatsAppSession<TungsteniteWsConnection> {
    /// Connect to the backend and open a session on the new connection.
    pub async fn connect(config: WsClientConfig, callbacks: SessionCallbacks) -> FerracoResult<Self> {
        let connection = TungsteniteWsConnection::connect(config).await?;
        Ok(Self::open(connection, callbacks))
    }
}

impl<C: WebSocketConnection + 'static> WhatsAppSession<C> {
    /// Open a session over an established connection, starting at `Idle`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(connection: C, callbacks: SessionCallbacks) -> Self {
        let connection = Arc::new(connection);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        let shared = Arc::new(SessionShared {
            state_tx,
            callbacks: RwLock::new(callbacks),
            conversations: RwLock::new(HashSet::new()),
            closed: AtomicBool::new(false),
            gate: Mutex::new(()),
        });

        let incoming = connection.subscribe();
        let mut transport = connection.state();
        // Only phase changes after opening matter
        let _ = transport.borrow_and_update();

        let dispatcher = tokio::spawn(run_dispatcher(
            connection.clone(),
            shared.clone(),
            incoming,
            transport,
        ));

        info!("WhatsApp session opened");

        Self {
            connection,
            shared,
            state_rx,
            dispatcher,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub fn can_reconnect(&self) -> bool {
        can_reconnect(&self.state_rx.borrow())
    }

    pub fn status_category(&self) -> ConnectionStatusCategory {
        connection_status_category(&self.state_rx.borrow())
    }

    /// Apply a locally originated event such as `Initialize` or `Reset`.
    ///
    /// Returns whether the state changed. Ignored after shutdown.
    pub fn dispatch(&self, event: ConnectionEvent) -> bool {
        if self.is_closed() {
            debug!(event = event.name(), "Session closed, ignoring event");
            return false;
        }
        self.shared.apply(event)
    }

    /// Replace the callback set. The connection is left untouched.
    pub fn set_callbacks(&self, callbacks: SessionCallbacks) {
        debug!(registered = ?callbacks.registered(), "Replacing session callbacks");
        *self
            .shared
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner) = callbacks;
    }

    /// Ask the server for a conversation's events.
    ///
    /// Dropped without error when the transport is not connected.
    pub async fn subscribe_to_conversation(&self, conversation_id: &str) {
        if self.is_closed() || !self.connection.is_connected() {
            debug!(conversation_id, "Transport not connected, dropping subscribe");
            return;
        }

        let newly_added = self
            .shared
            .conversations_mut()
            .insert(conversation_id.to_string());

        if let Err(e) = self
            .connection
            .send(WsOutgoingMessage::subscribe(conversation_id))
            .await
        {
            warn!(conversation_id, "Failed to subscribe to conversation: {}", e);
            if newly_added {
                self.shared.conversations_mut().remove(conversation_id);
            }
        }
    }

    /// Stop delivery of a conversation's events.
    ///
    /// Local delivery stops immediately; the server is told only when the
    /// transport is connected.
    pub async fn unsubscribe_from_conversation(&self, conversation_id: &str) {
        self.shared.conversations_mut().remove(conversation_id);

        if self.is_closed() || !self.connection.is_connected() {
            debug!(conversation_id, "Transport not connected, dropping unsubscribe");
            return;
        }

        if let Err(e) = self
            .connection
            .send(WsOutgoingMessage::unsubscribe(conversation_id))
            .await
        {
            warn!(conversation_id, "Failed to unsubscribe from conversation: {}", e);
        }
    }

    /// Conversations currently subscribed, sorted.
    pub fn subscribed_conversations(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.shared.conversations().iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Stop dispatching and close the transport. Idempotent.
    ///
    /// Blocks until a callback already running on another thread returns.
    /// No callback starts after this returns; the last state is kept.
    pub fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.wait_for_dispatch();
        self.dispatcher.abort();
        self.connection.shutdown();
        info!("WhatsApp session closed");
    }
}

impl<C: WebSocketConnection + 'static> Drop for WhatsAppSession<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
