//! Transition function for the connection state machine.
//!
//! `(ConnectionState, ConnectionEvent) -> ConnectionState`, with no I/O and
//! no side effects beyond a log line. Illegal pairs leave the state
//! untouched.
//!
//! | From | Event | To |
//! |------|-------|----|
//! | Idle, Disconnected, Error | Initialize | Initializing |
//! | Initializing, QrAvailable, Disconnected | QrReceived | QrAvailable |
//! | QrAvailable | QrScanned | Authenticating |
//! | Authenticating, QrAvailable, Initializing | Connected | Connected |
//! | any but Disconnected | Disconnected | Disconnected |
//! | any | Error | Error |
//! | any | Reset | Idle |

use thiserror::Error;
use tracing::{debug, warn};

use super::connection::ConnectionState;
use super::event::ConnectionEvent;

/// An event arrived in a state that does not accept it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal transition: '{event}' is not accepted in state '{from}'")]
pub struct TransitionError {
    pub from: &'static str,
    pub event: &'static str,
}

impl TransitionError {
    fn new(from: &ConnectionState, event: &ConnectionEvent) -> Self {
        Self {
            from: from.name(),
            event: event.name(),
        }
    }
}

/// Checked transition. Returns the next state, or why the pair is illegal.
///
/// Fields of the next state come from the event, with one exception: a QR
/// attempt never drops. A refresh keeps the larger of the current and the
/// incoming attempt, and an attempt of 0 is reported as 1.
pub fn try_transition(
    state: &ConnectionState,
    event: &ConnectionEvent,
) -> Result<ConnectionState, TransitionError> {
    use ConnectionEvent as E;
    use ConnectionState as S;

    match (state, event) {
        (_, E::Reset) => Ok(S::Idle),

        (_, E::Error { error, recoverable }) => Ok(S::Error {
            error: error.clone(),
            recoverable: recoverable.unwrap_or(true),
        }),

        (S::Disconnected { .. }, E::Disconnected { .. }) => Err(TransitionError::new(state, event)),
        (_, E::Disconnected { reason }) => Ok(S::Disconnected {
            reason: reason.clone(),
        }),

        (S::Idle | S::Disconnected { .. } | S::Error { .. }, E::Initialize) => Ok(S::Initializing),

        // QR refresh: the counter never goes backwards within a cycle
        (S::QrAvailable { attempt: previous, .. }, E::QrReceived { qr_code, attempt }) => {
            Ok(S::QrAvailable {
                qr_code: qr_code.clone(),
                attempt: (*attempt).max(*previous).max(1),
            })
        }
        (S::Initializing | S::Disconnected { .. }, E::QrReceived { qr_code, attempt }) => {
            Ok(S::QrAvailable {
                qr_code: qr_code.clone(),
                attempt: (*attempt).max(1),
            })
        }

        (S::QrAvailable { .. }, E::QrScanned) => Ok(S::Authenticating),

        // Initializing -> Connected covers a remembered session that needs no QR
        (
            S::Authenticating | S::QrAvailable { .. } | S::Initializing,
            E::Connected { account },
        ) => Ok(S::Connected {
            account: account.clone(),
        }),

        _ => Err(TransitionError::new(state, event)),
    }
}

/// Apply `event` to `state`.
///
/// Total: an illegal pair is logged at `warn` and the input state is
/// returned as-is. Legal pairs follow [`try_transition`], including its
/// QR attempt clamping.
pub fn transition(state: ConnectionState, event: ConnectionEvent) -> ConnectionState {
    match try_transition(&state, &event) {
        Ok(next) => {
            debug!(
                from = state.name(),
                to = next.name(),
                event = event.name(),
                "connection state transition"
            );
            next
        }
        Err(err) => {
            warn!(from = err.from, event = err.event, "{}", err);
            state
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connection::Account;

    fn qr(attempt: u32) -> ConnectionState {
        ConnectionState::QrAvailable {
            qr_code: format!("qr-{}", attempt),
            attempt,
        }
    }

    #[test]
    fn test_illegal_pair_is_reported() {
        let err = try_transition(&ConnectionState::Idle, &ConnectionEvent::QrScanned).unwrap_err();
        assert_eq!(err.from, "idle");
        assert_eq!(err.event, "qr_scanned");
        assert_eq!(
            err.to_string(),
            "illegal transition: 'qr_scanned' is not accepted in state 'idle'"
        );
    }

    #[test]
    fn test_illegal_pair_returns_input() {
        let state = ConnectionState::Authenticating;
        let next = transition(state.clone(), ConnectionEvent::Initialize);
        assert_eq!(next, state);
    }

    #[test]
    fn test_qr_refresh_increments_attempt() {
        let next = transition(qr(1), ConnectionEvent::qr_received("qr-2", 2));
        assert_eq!(next, qr(2));
    }

    #[test]
    fn test_qr_refresh_never_decreases_attempt() {
        let next = transition(qr(3), ConnectionEvent::qr_received("fresh", 1));
        assert_eq!(
            next,
            ConnectionState::QrAvailable {
                qr_code: "fresh".to_string(),
                attempt: 3
            }
        );
    }

    #[test]
    fn test_zero_attempt_is_clamped() {
        let next = transition(
            ConnectionState::Initializing,
            ConnectionEvent::qr_received("abc", 0),
        );
        assert_eq!(
            next,
            ConnectionState::QrAvailable {
                qr_code: "abc".to_string(),
                attempt: 1
            }
        );
    }

    #[test]
    fn test_new_cycle_restarts_attempt() {
        let state = transition(qr(4), ConnectionEvent::disconnected("QR Code expirou"));
        let state = transition(state, ConnectionEvent::Reset);
        let state = transition(state, ConnectionEvent::Initialize);
        let state = transition(state, ConnectionEvent::qr_received("qr-1", 1));
        assert_eq!(state, qr(1));
    }

    #[test]
    fn test_error_defaults_to_recoverable() {
        let next = transition(ConnectionState::Idle, ConnectionEvent::error("boom"));
        assert_eq!(
            next,
            ConnectionState::Error {
                error: "boom".to_string(),
                recoverable: true
            }
        );
    }

    #[test]
    fn test_connected_directly_from_initializing() {
        let account = Account::new("5511999999999", "Test", "web");
        let next = transition(
            ConnectionState::Initializing,
            ConnectionEvent::connected(account.clone()),
        );
        assert_eq!(next, ConnectionState::Connected { account });
    }

    #[test]
    fn test_disconnected_twice_keeps_first_reason() {
        let state = transition(ConnectionState::Idle, ConnectionEvent::disconnected("first"));
        let state = transition(state, ConnectionEvent::disconnected("second"));
        assert_eq!(
            state,
            ConnectionState::Disconnected {
                reason: Some("first".to_string())
            }
        );
    }
}
