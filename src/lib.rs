//! Ferraco WhatsApp - connection state machine and real-time transport
//!
//! This library exposes modules for use in integration tests and by the
//! `ferraco-wa` binary.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod error;
pub mod prelude;
pub mod session;
pub mod traits;
pub mod websocket;
