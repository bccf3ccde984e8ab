//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`WebSocketConnection`] - WebSocket connection management

pub mod websocket;

pub use websocket::WebSocketConnection;
