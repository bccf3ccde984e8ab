//! WhatsApp connection state.
//!
//! This module provides [`ConnectionState`], the single live phase of a
//! WhatsApp pairing session, and [`Account`], the identity attached to a
//! connected session.

use serde::{Deserialize, Serialize};

/// Identity of the phone paired with the bridge.
///
/// Only ever owned by [`ConnectionState::Connected`]; a reconnection replaces
/// it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub phone: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic_url: Option<String>,
}

impl Account {
    /// Create an account without a profile picture.
    pub fn new(
        phone: impl Into<String>,
        name: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            phone: phone.into(),
            name: name.into(),
            platform: platform.into(),
            profile_pic_url: None,
        }
    }

    /// Attach a profile picture URL.
    pub fn with_profile_pic_url(mut self, url: impl Into<String>) -> Self {
        self.profile_pic_url = Some(url.into());
        self
    }
}

/// Current phase of a WhatsApp session.
///
/// Exactly one variant is live at a time. Values are never mutated in place:
/// every accepted transition produces a new value (see
/// [`transition`](super::reducer::transition)).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No session attempted yet, or explicitly reset
    #[default]
    Idle,
    /// Session bootstrap in progress, no QR yet
    Initializing,
    /// A scannable pairing code was issued
    QrAvailable {
        #[serde(rename = "qrCode")]
        qr_code: String,
        /// Counts successive QR refreshes, starting at 1
        attempt: u32,
    },
    /// QR scanned by the device; bridge is completing the handshake
    Authenticating,
    /// Session is live
    Connected { account: Account },
    /// Session ended
    Disconnected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// A fault occurred
    Error { error: String, recoverable: bool },
}

impl ConnectionState {
    /// Stable snake_case name of the variant, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Initializing => "initializing",
            ConnectionState::QrAvailable { .. } => "qr_available",
            ConnectionState::Authenticating => "authenticating",
            ConnectionState::Connected { .. } => "connected",
            ConnectionState::Disconnected { .. } => "disconnected",
            ConnectionState::Error { .. } => "error",
        }
    }

    /// Check if the session is live.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }

    /// The paired account, if connected.
    pub fn account(&self) -> Option<&Account> {
        match self {
            ConnectionState::Connected { account } => Some(account),
            _ => None,
        }
    }

    /// The current pairing code, if one is on display.
    pub fn qr_code(&self) -> Option<&str> {
        match self {
            ConnectionState::QrAvailable { qr_code, .. } => Some(qr_code),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::QrAvailable { attempt, .. } => {
                write!(f, "qr_available (attempt {})", attempt)
            }
            ConnectionState::Connected { account } => {
                write!(f, "connected as {} ({})", account.name, account.phone)
            }
            ConnectionState::Disconnected {
                reason: Some(reason),
            } => write!(f, "disconnected: {}", reason),
            ConnectionState::Error { error, recoverable } => {
                let kind = if *recoverable { "recoverable" } else { "fatal" };
                write!(f, "error ({}): {}", kind, error)
            }
            other => f.write_str(other.name()),
        }
    }
}
