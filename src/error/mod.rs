//! Unified error handling for the WhatsApp connection core.
//!
//! Faults that belong to the WhatsApp session (bridge errors, QR read
//! failures, dropped sessions) never surface here: they are folded into
//! [`ConnectionState`](crate::domain::ConnectionState). This module covers
//! the failures a caller can actually act on: opening the transport and
//! reading configuration.
//!
//! | Category | Source | Retryable |
//! |----------|--------|-----------|
//! | Network | connect/send failures | Yes |
//! | Protocol | malformed frames | No |
//! | Client | illegal transitions via `try_transition` | No |
//! | Configuration | bad `FERRACO_WS_*` values | No |

mod category;
mod config;

pub use category::ErrorCategory;
pub use config::ConfigError;

use thiserror::Error;

use crate::domain::TransitionError;
use crate::websocket::WsError;

/// Any error produced by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FerracoError {
    #[error(transparent)]
    WebSocket(#[from] WsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Result type using [`FerracoError`].
pub type FerracoResult<T> = Result<T, FerracoError>;

impl FerracoError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FerracoError::WebSocket(WsError::ParseError(_)) => ErrorCategory::Protocol,
            FerracoError::WebSocket(_) => ErrorCategory::Network,
            FerracoError::Config(_) => ErrorCategory::Configuration,
            FerracoError::Transition(_) => ErrorCategory::Client,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Message suitable for showing to an operator.
    pub fn user_message(&self) -> String {
        match self {
            FerracoError::WebSocket(WsError::ConnectionFailed(_)) => {
                "Não foi possível conectar ao servidor. Verifique se o backend está em execução."
                    .to_string()
            }
            FerracoError::WebSocket(WsError::Disconnected) => {
                "Conexão com o servidor perdida.".to_string()
            }
            FerracoError::WebSocket(WsError::SendFailed(_)) => {
                "Falha ao enviar dados ao servidor.".to_string()
            }
            FerracoError::WebSocket(WsError::ParseError(_)) => {
                "O servidor enviou uma mensagem inválida.".to_string()
            }
            FerracoError::Config(err) => format!("Configuração inválida: {}", err),
            FerracoError::Transition(err) => format!("Operação inválida: {}", err),
        }
    }
}
