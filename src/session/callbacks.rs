//! Consumer-supplied callbacks for a [`WhatsAppSession`](super::WhatsAppSession).

use std::fmt;
use std::sync::Arc;

use crate::domain::Account;
use crate::websocket::messages::{
    WsChatMessage, WsConversationUpdate, WsMessageStatus, WsPresence, WsQrCode, WsReaction,
    WsTyping,
};

/// A shareable callback taking the event payload by reference.
pub type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// The set of callbacks a session invokes for inbound events.
///
/// Every field is optional; an unset callback simply means nobody is
/// listening for that event. Each inbound event invokes at most one of them.
#[derive(Clone, Default)]
pub struct SessionCallbacks {
    pub on_qr: Option<Callback<WsQrCode>>,
    /// Raw bridge status string, before mapping
    pub on_status: Option<Callback<String>>,
    pub on_ready: Option<Callback<Account>>,
    pub on_disconnected: Option<Callback<Option<String>>>,
    pub on_error: Option<Callback<String>>,
    pub on_message: Option<Callback<WsChatMessage>>,
    pub on_message_status: Option<Callback<WsMessageStatus>>,
    pub on_conversation_update: Option<Callback<WsConversationUpdate>>,
    pub on_typing: Option<Callback<WsTyping>>,
    pub on_presence: Option<Callback<WsPresence>>,
    pub on_reaction: Option<Callback<WsReaction>>,
}

impl SessionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_qr(mut self, f: impl Fn(&WsQrCode) + Send + Sync + 'static) -> Self {
        self.on_qr = Some(Arc::new(f));
        self
    }

    pub fn on_status(mut self, f: impl Fn(&String) + Send + Sync + 'static) -> Self {
        self.on_status = Some(Arc::new(f));
        self
    }

    pub fn on_ready(mut self, f: impl Fn(&Account) + Send + Sync + 'static) -> Self {
        self.on_ready = Some(Arc::new(f));
        self
    }

    pub fn on_disconnected(mut self, f: impl Fn(&Option<String>) + Send + Sync + 'static) -> Self {
        self.on_disconnected = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&String) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn on_message(mut self, f: impl Fn(&WsChatMessage) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(f));
        self
    }

    pub fn on_message_status(
        mut self,
        f: impl Fn(&WsMessageStatus) + Send + Sync + 'static,
    ) -> Self {
        self.on_message_status = Some(Arc::new(f));
        self
    }

    pub fn on_conversation_update(
        mut self,
        f: impl Fn(&WsConversationUpdate) + Send + Sync + 'static,
    ) -> Self {
        self.on_conversation_update = Some(Arc::new(f));
        self
    }

    pub fn on_typing(mut self, f: impl Fn(&WsTyping) + Send + Sync + 'static) -> Self {
        self.on_typing = Some(Arc::new(f));
        self
    }

    pub fn on_presence(mut self, f: impl Fn(&WsPresence) + Send + Sync + 'static) -> Self {
        self.on_presence = Some(Arc::new(f));
        self
    }

    pub fn on_reaction(mut self, f: impl Fn(&WsReaction) + Send + Sync + 'static) -> Self {
        self.on_reaction = Some(Arc::new(f));
        self
    }

    /// Names of the callbacks that are set.
    pub fn registered(&self) -> Vec<&'static str> {
        let slots = [
            ("on_qr", self.on_qr.is_some()),
            ("on_status", self.on_status.is_some()),
            ("on_ready", self.on_ready.is_some()),
            ("on_disconnected", self.on_disconnected.is_some()),
            ("on_error", self.on_error.is_some()),
            ("on_message", self.on_message.is_some()),
            ("on_message_status", self.on_message_status.is_some()),
            ("on_conversation_update", self.on_conversation_update.is_some()),
            ("on_typing", self.on_typing.is_some()),
            ("on_presence", self.on_presence.is_some()),
            ("on_reaction", self.on_reaction.is_some()),
        ];
        slots
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }
}

impl fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCallbacks")
            .field("registered", &self.registered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered() {
        let callbacks = SessionCallbacks::new()
            .on_qr(|_| {})
            .on_typing(|_| {});
        assert_eq!(callbacks.registered(), vec!["on_qr", "on_typing"]);
        assert!(SessionCallbacks::default().registered().is_empty());
    }

    #[test]
    fn test_debug_lists_registered() {
        let callbacks = SessionCallbacks::new().on_error(|_| {});
        assert_eq!(
            format!("{:?}", callbacks),
            "SessionCallbacks { registered: [\"on_error\"] }"
        );
    }
}
