//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```ignore
//! use ferraco_whatsapp::prelude::*;
//! ```
//!
//! This will import:
//! - State machine types (ConnectionState, ConnectionEvent, transition)
//! - Session types (WhatsAppSession, SessionCallbacks)
//! - Transport types (WsClientConfig, WebSocketConnection)
//! - Error types (FerracoError, FerracoResult)

// State machine
pub use crate::domain::{
    can_reconnect, connection_status_category, map_status, transition, try_transition, Account,
    ConnectionEvent, ConnectionState, ConnectionStatusCategory,
};

// Session
pub use crate::session::{SessionCallbacks, WhatsAppSession};

// Transport
pub use crate::traits::WebSocketConnection;
pub use crate::websocket::{WsClientConfig, WsConnectionState, WsIncomingMessage};

// Errors
pub use crate::error::{FerracoError, FerracoResult};
