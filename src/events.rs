//! Transport independent inbound events.
//!
//! The Matrix sync loop translates room events into [`InboundEvent`]s and
//! pushes them to the router. Bots never see SDK types.

use crate::sink::{ImageContent, LocationContent};

/// An event received in a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    /// Conversation (room) the event happened in
    pub conversation_id: String,
    /// User who caused the event
    pub sender_id: String,
    /// Identifier of the message, empty for events without one
    pub message_id: String,
    pub payload: EventPayload,
}

/// Type specific content of an [`InboundEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// A text message
    Text { text: String },
    /// The bot was invited into a conversation
    ConnectionRequest,
    /// An image, already downloaded
    Image(ImageContent),
    /// A shared location
    Location(LocationContent),
    /// Someone started or stopped typing
    Typing { active: bool },
}

impl EventPayload {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::Text { .. } => "text",
            EventPayload::ConnectionRequest => "connection request",
            EventPayload::Image(_) => "image",
            EventPayload::Location(_) => "location",
            EventPayload::Typing { .. } => "typing",
        }
    }

    /// Whether the sender expects a read confirmation for this event.
    pub fn is_confirmable(&self) -> bool {
        matches!(
            self,
            EventPayload::Text { .. } | EventPayload::Image(_) | EventPayload::Location(_)
        )
    }
}
