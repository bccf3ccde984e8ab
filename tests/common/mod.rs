//! Common test utilities for integration tests.
//!
//! Fixtures for domain values and inbound frames, plus helpers that wait on
//! session state without sleeping.

#![allow(dead_code)]

use std::time::Duration;

use ferraco_whatsapp::domain::{Account, ConnectionState};
use ferraco_whatsapp::websocket::{
    WsChatMessage, WsDisconnected, WsErrorNotice, WsIncomingMessage, WsQrCode, WsStatus, WsTyping,
};
use tokio::sync::{mpsc, watch};

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(2);

pub fn test_account() -> Account {
    Account::new("5511999999999", "Test", "web")
}

pub fn all_states() -> Vec<ConnectionState> {
    vec![
        ConnectionState::Idle,
        ConnectionState::Initializing,
        ConnectionState::QrAvailable {
            qr_code: "abc".to_string(),
            attempt: 2,
        },
        ConnectionState::Authenticating,
        ConnectionState::Connected {
            account: test_account(),
        },
        ConnectionState::Disconnected {
            reason: Some("Desconectado do celular".to_string()),
        },
        ConnectionState::Disconnected { reason: None },
        ConnectionState::Error {
            error: "boom".to_string(),
            recoverable: true,
        },
        ConnectionState::Error {
            error: "boom".to_string(),
            recoverable: false,
        },
    ]
}

pub fn qr_frame(qr_code: &str, attempt: u32) -> WsIncomingMessage {
    WsIncomingMessage::Qr(WsQrCode {
        qr_code: qr_code.to_string(),
        attempt,
    })
}

pub fn status_frame(raw: &str) -> WsIncomingMessage {
    WsIncomingMessage::Status(WsStatus {
        status: raw.to_string(),
    })
}

pub fn ready_frame() -> WsIncomingMessage {
    WsIncomingMessage::Ready(test_account())
}

pub fn disconnected_frame(reason: Option<&str>) -> WsIncomingMessage {
    WsIncomingMessage::Disconnected(WsDisconnected {
        reason: reason.map(str::to_string),
    })
}

pub fn error_frame(message: &str, recoverable: Option<bool>) -> WsIncomingMessage {
    WsIncomingMessage::Error(WsErrorNotice {
        message: message.to_string(),
        recoverable,
    })
}

pub fn chat_frame(conversation_id: &str, id: &str) -> WsIncomingMessage {
    WsIncomingMessage::NewMessage(WsChatMessage {
        id: id.to_string(),
        conversation_id: conversation_id.to_string(),
        body: "Olá".to_string(),
        from_me: false,
        kind: Some("chat".to_string()),
        timestamp: None,
    })
}

pub fn typing_frame(conversation_id: &str) -> WsIncomingMessage {
    WsIncomingMessage::Typing(WsTyping {
        conversation_id: conversation_id.to_string(),
        is_typing: true,
    })
}

/// Wait until the session state satisfies `pred`, returning that state.
pub async fn wait_for_state<F>(rx: &mut watch::Receiver<ConnectionState>, pred: F) -> ConnectionState
where
    F: FnMut(&ConnectionState) -> bool,
{
    tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for state")
        .expect("state channel closed")
        .clone()
}

/// Receive the next callback payload, failing the test after [`WAIT`].
pub async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for callback")
        .expect("callback channel closed")
}

/// True when nothing arrives within a short window.
pub async fn stays_silent<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> bool {
    match tokio::time::timeout(Duration::from_millis(150), rx.recv()).await {
        Err(_) => true,
        Ok(None) => true,
        Ok(Some(_)) => false,
    }
}
