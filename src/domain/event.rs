//! Input vocabulary of the connection state machine.

use super::connection::Account;

/// Event fed to [`transition`](super::reducer::transition).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Start (or restart) a pairing session
    Initialize,
    /// The bridge issued a new pairing code
    QrReceived { qr_code: String, attempt: u32 },
    /// The device scanned the pairing code
    QrScanned,
    /// Handshake completed for the given account
    Connected { account: Account },
    /// The session ended
    Disconnected { reason: Option<String> },
    /// A fault occurred; `None` means recoverable
    Error {
        error: String,
        recoverable: Option<bool>,
    },
    /// Return to idle
    Reset,
}

impl ConnectionEvent {
    pub fn qr_received(qr_code: impl Into<String>, attempt: u32) -> Self {
        ConnectionEvent::QrReceived {
            qr_code: qr_code.into(),
            attempt,
        }
    }

    pub fn connected(account: Account) -> Self {
        ConnectionEvent::Connected { account }
    }

    pub fn disconnected(reason: impl Into<String>) -> Self {
        ConnectionEvent::Disconnected {
            reason: Some(reason.into()),
        }
    }

    /// An error event that leaves `recoverable` unspecified.
    pub fn error(error: impl Into<String>) -> Self {
        ConnectionEvent::Error {
            error: error.into(),
            recoverable: None,
        }
    }

    pub fn fatal(error: impl Into<String>) -> Self {
        ConnectionEvent::Error {
            error: error.into(),
            recoverable: Some(false),
        }
    }

    /// Stable snake_case name of the variant, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionEvent::Initialize => "initialize",
            ConnectionEvent::QrReceived { .. } => "qr_received",
            ConnectionEvent::QrScanned => "qr_scanned",
            ConnectionEvent::Connected { .. } => "connected",
            ConnectionEvent::Disconnected { .. } => "disconnected",
            ConnectionEvent::Error { .. } => "error",
            ConnectionEvent::Reset => "reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(
            ConnectionEvent::qr_received("abc", 2),
            ConnectionEvent::QrReceived {
                qr_code: "abc".to_string(),
                attempt: 2
            }
        );
        assert_eq!(
            ConnectionEvent::error("x"),
            ConnectionEvent::Error {
                error: "x".to_string(),
                recoverable: None
            }
        );
        assert_eq!(
            ConnectionEvent::fatal("x"),
            ConnectionEvent::Error {
                error: "x".to_string(),
                recoverable: Some(false)
            }
        );
    }

    #[test]
    fn test_names() {
        assert_eq!(ConnectionEvent::Initialize.name(), "initialize");
        assert_eq!(ConnectionEvent::disconnected("bye").name(), "disconnected");
        assert_eq!(ConnectionEvent::Reset.name(), "reset");
    }
}
