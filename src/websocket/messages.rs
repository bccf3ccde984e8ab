use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Account;
use crate::websocket::WsError;

/// Named events pushed by the backend.
///
/// Frames are JSON text of the form `{"event": "<name>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum WsIncomingMessage {
    /// New pairing code issued by the bridge
    #[serde(rename = "whatsapp:qr")]
    Qr(WsQrCode),
    /// Raw bridge status string
    #[serde(rename = "whatsapp:status")]
    Status(WsStatus),
    /// Session is live for the given account
    #[serde(rename = "whatsapp:ready")]
    Ready(Account),
    #[serde(rename = "whatsapp:disconnected")]
    Disconnected(WsDisconnected),
    #[serde(rename = "whatsapp:error")]
    Error(WsErrorNotice),
    #[serde(rename = "message:new")]
    NewMessage(WsChatMessage),
    #[serde(rename = "message:status")]
    MessageStatus(WsMessageStatus),
    #[serde(rename = "conversation:update")]
    ConversationUpdate(WsConversationUpdate),
    #[serde(rename = "typing")]
    Typing(WsTyping),
    #[serde(rename = "presence")]
    Presence(WsPresence),
    #[serde(rename = "reaction")]
    Reaction(WsReaction),
}

impl WsIncomingMessage {
    /// Decode one text frame.
    pub fn parse(text: &str) -> Result<Self, WsError> {
        serde_json::from_str(text).map_err(|e| WsError::ParseError(e.to_string()))
    }

    /// Wire name of the event.
    pub fn event_name(&self) -> &'static str {
        match self {
            WsIncomingMessage::Qr(_) => "whatsapp:qr",
            WsIncomingMessage::Status(_) => "whatsapp:status",
            WsIncomingMessage::Ready(_) => "whatsapp:ready",
            WsIncomingMessage::Disconnected(_) => "whatsapp:disconnected",
            WsIncomingMessage::Error(_) => "whatsapp:error",
            WsIncomingMessage::NewMessage(_) => "message:new",
            WsIncomingMessage::MessageStatus(_) => "message:status",
            WsIncomingMessage::ConversationUpdate(_) => "conversation:update",
            WsIncomingMessage::Typing(_) => "typing",
            WsIncomingMessage::Presence(_) => "presence",
            WsIncomingMessage::Reaction(_) => "reaction",
        }
    }

    /// Conversation the event is scoped to, if any.
    ///
    /// Session-level events (`whatsapp:*`) return `None`.
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            WsIncomingMessage::NewMessage(m) => Some(&m.conversation_id),
            WsIncomingMessage::MessageStatus(m) => Some(&m.conversation_id),
            WsIncomingMessage::ConversationUpdate(m) => Some(&m.conversation_id),
            WsIncomingMessage::Typing(m) => Some(&m.conversation_id),
            WsIncomingMessage::Presence(m) => Some(&m.conversation_id),
            WsIncomingMessage::Reaction(m) => Some(&m.conversation_id),
            WsIncomingMessage::Qr(_)
            | WsIncomingMessage::Status(_)
            | WsIncomingMessage::Ready(_)
            | WsIncomingMessage::Disconnected(_)
            | WsIncomingMessage::Error(_) => None,
        }
    }
}

fn default_attempt() -> u32 {
    1
}

/// Pairing code issuance
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsQrCode {
    /// QR image, usually a `data:image/png;base64,...` URL
    pub qr_code: String,
    #[serde(alias = "attempts", default = "default_attempt")]
    pub attempt: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WsStatus {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct WsDisconnected {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Generic error notification from the bridge
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WsErrorNotice {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recoverable: Option<bool>,
}

/// A chat message pushed into a conversation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsChatMessage {
    pub id: String,
    pub conversation_id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub from_me: bool,
    /// Message kind as reported by the bridge (`chat`, `image`, `ptt`, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Delivery/read status change of a sent message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsMessageStatus {
    pub message_id: String,
    pub conversation_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsConversationUpdate {
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsTyping {
    pub conversation_id: String,
    #[serde(default)]
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsPresence {
    pub conversation_id: String,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsReaction {
    pub conversation_id: String,
    pub message_id: String,
    pub emoji: String,
    #[serde(default)]
    pub from_me: bool,
}

/// Reference to a conversation in outgoing requests
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsConversationRef {
    pub conversation_id: String,
}

/// Outgoing WebSocket messages (sent to server)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum WsOutgoingMessage {
    #[serde(rename = "subscribe:conversation")]
    SubscribeConversation(WsConversationRef),
    #[serde(rename = "unsubscribe:conversation")]
    UnsubscribeConversation(WsConversationRef),
}

impl WsOutgoingMessage {
    pub fn subscribe(conversation_id: impl Into<String>) -> Self {
        WsOutgoingMessage::SubscribeConversation(WsConversationRef {
            conversation_id: conversation_id.into(),
        })
    }

    pub fn unsubscribe(conversation_id: impl Into<String>) -> Self {
        WsOutgoingMessage::UnsubscribeConversation(WsConversationRef {
            conversation_id: conversation_id.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_qr() {
        let json = r#"{
            "event": "whatsapp:qr",
            "data": {"qrCode": "data:image/png;base64,AAAA", "attempt": 2}
        }"#;

        let msg: WsIncomingMessage = serde_json::from_str(json).unwrap();
        match msg {
            WsIncomingMessage::Qr(qr) => {
                assert_eq!(qr.qr_code, "data:image/png;base64,AAAA");
                assert_eq!(qr.attempt, 2);
            }
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_qr_accepts_attempts_alias_and_default() {
        let msg: WsIncomingMessage = serde_json::from_str(
            r#"{"event":"whatsapp:qr","data":{"qrCode":"abc","attempts":4}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            WsIncomingMessage::Qr(WsQrCode {
                qr_code: "abc".to_string(),
                attempt: 4
            })
        );

        let msg: WsIncomingMessage =
            serde_json::from_str(r#"{"event":"whatsapp:qr","data":{"qrCode":"abc"}}"#).unwrap();
        assert_eq!(
            msg,
            WsIncomingMessage::Qr(WsQrCode {
                qr_code: "abc".to_string(),
                attempt: 1
            })
        );
    }

    #[test]
    fn test_deserialize_ready() {
        let json = r#"{
            "event": "whatsapp:ready",
            "data": {"phone": "5511999999999", "name": "Test", "platform": "web"}
        }"#;

        let msg: WsIncomingMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            WsIncomingMessage::Ready(Account::new("5511999999999", "Test", "web"))
        );
        assert!(msg.conversation_id().is_none());
    }

    #[test]
    fn test_deserialize_error_without_recoverable() {
        let msg: WsIncomingMessage = serde_json::from_str(
            r#"{"event":"whatsapp:error","data":{"message":"Sessão inválida"}}"#,
        )
        .unwrap();
        match msg {
            WsIncomingMessage::Error(err) => {
                assert_eq!(err.message, "Sessão inválida");
                assert!(err.recoverable.is_none());
            }
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_conversation_scoped_events() {
        let msg: WsIncomingMessage = serde_json::from_str(
            r#"{"event":"typing","data":{"conversationId":"conv-1","isTyping":true}}"#,
        )
        .unwrap();
        assert_eq!(msg.conversation_id(), Some("conv-1"));
        assert_eq!(msg.event_name(), "typing");

        let msg: WsIncomingMessage = serde_json::from_str(
            r#"{"event":"message:new","data":{"id":"m1","conversationId":"conv-2","body":"Olá","fromMe":false,"type":"chat","timestamp":"2026-01-05T12:00:00Z"}}"#,
        )
        .unwrap();
        match &msg {
            WsIncomingMessage::NewMessage(m) => {
                assert_eq!(m.body, "Olá");
                assert_eq!(m.kind.as_deref(), Some("chat"));
                assert!(m.timestamp.is_some());
            }
            _ => panic!("Unexpected message type"),
        }
        assert_eq!(msg.conversation_id(), Some("conv-2"));
    }

    #[test]
    fn test_unknown_event_fails() {
        let result =
            serde_json::from_str::<WsIncomingMessage>(r#"{"event":"nope","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_subscribe() {
        let json = serde_json::to_value(WsOutgoingMessage::subscribe("conv-9")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "subscribe:conversation",
                "data": {"conversationId": "conv-9"}
            })
        );

        let json = serde_json::to_value(WsOutgoingMessage::unsubscribe("conv-9")).unwrap();
        assert_eq!(json["event"], "unsubscribe:conversation");
    }
}
