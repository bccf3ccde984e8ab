//! Mock implementations for testing.
//!
//! - [`MockWebSocket`] - WebSocket connection with message injection and
//!   sent-message capture

pub mod websocket;

pub use websocket::MockWebSocket;
