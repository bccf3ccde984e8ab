//! UI-facing projections of [`ConnectionState`].

use serde::{Deserialize, Serialize};

use super::connection::ConnectionState;

/// Four-way simplification of the connection state for status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatusCategory {
    Online,
    Offline,
    Connecting,
    Error,
}

impl ConnectionStatusCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatusCategory::Online => "online",
            ConnectionStatusCategory::Offline => "offline",
            ConnectionStatusCategory::Connecting => "connecting",
            ConnectionStatusCategory::Error => "error",
        }
    }
}

impl std::fmt::Display for ConnectionStatusCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a reconnect affordance should be offered.
///
/// True for any disconnect and for recoverable errors. `Idle` has nothing to
/// reconnect from.
pub fn can_reconnect(state: &ConnectionState) -> bool {
    match state {
        ConnectionState::Disconnected { .. } => true,
        ConnectionState::Error { recoverable, .. } => *recoverable,
        ConnectionState::Idle
        | ConnectionState::Initializing
        | ConnectionState::QrAvailable { .. }
        | ConnectionState::Authenticating
        | ConnectionState::Connected { .. } => false,
    }
}

pub fn connection_status_category(state: &ConnectionState) -> ConnectionStatusCategory {
    match state {
        ConnectionState::Connected { .. } => ConnectionStatusCategory::Online,
        ConnectionState::Idle | ConnectionState::Disconnected { .. } => {
            ConnectionStatusCategory::Offline
        }
        ConnectionState::Initializing
        | ConnectionState::QrAvailable { .. }
        | ConnectionState::Authenticating => ConnectionStatusCategory::Connecting,
        ConnectionState::Error { .. } => ConnectionStatusCategory::Error,
    }
}
