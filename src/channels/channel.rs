//! The `Channel` trait and the event/response types that cross it.
//!
//! The flow engine never performs network I/O: it consumes [`EventPayload`]s
//! and returns [`Outbound`] descriptions of what to send. Channels own the
//! wire.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;

/// Stream of inbound events produced by a channel.
pub type EventStream = Pin<Box<dyn Stream<Item = InboundEvent> + Send>>;

/// What kind of attachment arrived with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Photo,
    Document,
}

/// One physical user action, as the flow engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    /// A plain text message.
    Text(String),
    /// An inline-button press carrying its callback tag.
    Callback(String),
    /// A photo or document upload.
    Attachment(AttachmentKind),
}

impl EventPayload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&str> {
        match self {
            Self::Callback(tag) => Some(tag),
            _ => None,
        }
    }
}

/// An inbound event scoped to one user identity.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Which channel delivered the event.
    pub channel: String,
    /// Opaque user identity, unique within the channel.
    pub user_id: String,
    pub payload: EventPayload,
    /// Channel-specific addressing data (chat id, username, ...).
    pub metadata: serde_json::Value,
}

impl InboundEvent {
    pub fn new(channel: &str, user_id: &str, payload: EventPayload) -> Self {
        Self {
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            payload,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One inline-keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub callback: String,
}

impl Button {
    pub fn new(label: impl Into<String>, callback: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback: callback.into(),
        }
    }
}

/// Rows of inline buttons attached to an outbound message.
///
/// Keyboards are rendered fresh from session state on every emit; nothing
/// mutates a button after construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn from_rows(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }
}

/// A description of one message to send back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Outbound {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// A message transport.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Short channel name for logging.
    fn name(&self) -> &str;

    /// Start listening and return the stream of inbound events.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    /// Send one outbound message in reply to an inbound event.
    async fn respond(&self, event: &InboundEvent, response: Outbound) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_accessors() {
        let text = EventPayload::Text("hello".into());
        assert_eq!(text.as_text(), Some("hello"));
        assert_eq!(text.as_callback(), None);

        let cb = EventPayload::Callback("menu".into());
        assert_eq!(cb.as_callback(), Some("menu"));
        assert_eq!(cb.as_text(), None);

        let attach = EventPayload::Attachment(AttachmentKind::Photo);
        assert_eq!(attach.as_text(), None);
        assert_eq!(attach.as_callback(), None);
    }

    #[test]
    fn outbound_builder() {
        let kb = Keyboard::from_rows(vec![vec![Button::new("Yes", "debt_yes")]]);
        let out = Outbound::text("Any loans?").with_keyboard(kb.clone());
        assert_eq!(out.text, "Any loans?");
        assert_eq!(out.keyboard, Some(kb));
    }

    #[test]
    fn event_metadata_default_null() {
        let event = InboundEvent::new("cli", "local-user", EventPayload::Text("hi".into()));
        assert!(event.metadata.is_null());

        let event = event.with_metadata(serde_json::json!({"chat_id": "42"}));
        assert_eq!(event.metadata["chat_id"], "42");
    }
}
