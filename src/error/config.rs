//! Configuration errors.

use thiserror::Error;

/// Invalid connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("WebSocket URL must start with ws:// or wss://, got '{url}'")]
    InvalidUrl { url: String },
}
