//! WhatsApp connection state machine.
//!
//! ## Building blocks
//!
//! - [`ConnectionState`] / [`Account`] - the live session phase
//! - [`ConnectionEvent`] - what can happen to a session
//! - [`transition`] - the pure `(state, event) -> state` function
//! - [`map_status`] - raw bridge status strings to events
//! - [`can_reconnect`] / [`connection_status_category`] - UI projections

pub mod connection;
pub mod event;
pub mod reducer;
pub mod status;
pub mod view;

pub use connection::{Account, ConnectionState};
pub use event::ConnectionEvent;
pub use reducer::{transition, try_transition, TransitionError};
pub use status::map_status;
pub use view::{can_reconnect, connection_status_category, ConnectionStatusCategory};
