//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`TungsteniteWsConnection`] - WebSocket using tokio-tungstenite
//!
//! # Mock Implementations
//!
//! - [`mock::MockWebSocket`] - Message injection for testing

pub mod mock;
pub mod tungstenite_ws;

pub use mock::MockWebSocket;
pub use tungstenite_ws::TungsteniteWsConnection;
