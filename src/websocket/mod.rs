//! WebSocket client for the backend's WhatsApp event stream.
//!
//! This module provides a WebSocket client with bounded, fixed-delay
//! reconnection. It decodes the backend's named events (pairing codes,
//! bridge status, readiness, conversation traffic) and sends conversation
//! subscription requests back.

pub mod client;
pub mod messages;

pub use client::{WsClient, WsClientConfig, WsConnectionState, WsError};
pub use messages::{
    WsChatMessage, WsConversationRef, WsConversationUpdate, WsDisconnected, WsErrorNotice,
    WsIncomingMessage, WsMessageStatus, WsOutgoingMessage, WsPresence, WsQrCode, WsReaction,
    WsStatus, WsTyping,
};
