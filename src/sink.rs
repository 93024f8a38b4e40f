//! Outbound messaging capability.
//!
//! Bots only talk to the chat network through [`MessageSink`]. The Matrix
//! client implements it in production and tests use the generated
//! [`MockMessageSink`].
//!
//! Sending never fails from the caller's point of view: implementations log
//! delivery errors themselves.

use mime::Mime;
use mockall::automock;

/// Reactions a bot can put on a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
}

impl Reaction {
    /// The annotation key sent on the wire.
    pub fn key(&self) -> &'static str {
        match self {
            Reaction::Like => "❤️",
        }
    }
}

/// An image ready to be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageContent {
    /// File name shown to the recipients
    pub name: String,
    pub mime: Mime,
    pub data: Vec<u8>,
}

impl ImageContent {
    /// Builds an image from downloaded bytes.
    ///
    /// The MIME type comes from the `content-type` header when it is an image
    /// type, `image/png` is assumed otherwise.
    pub fn from_download(name: &str, content_type: Option<&str>, data: Vec<u8>) -> Self {
        let mime = content_type
            .and_then(|value| value.parse::<Mime>().ok())
            .filter(|mime| mime.type_() == mime::IMAGE)
            .unwrap_or(mime::IMAGE_PNG);

        ImageContent {
            name: name.to_owned(),
            mime,
            data,
        }
    }
}

/// A shared location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationContent {
    /// Human readable description
    pub description: String,
    /// `geo:` URI of the location
    pub geo_uri: String,
}

/// Everything a bot can send into a conversation.
#[automock]
pub trait MessageSink {
    /// Sends a Markdown message.
    async fn send_text(&self, conversation_id: &str, text: &str);
    /// Sends a Markdown message quoting `message_id`.
    async fn send_reply(&self, conversation_id: &str, sender_id: &str, message_id: &str, text: &str);
    /// Uploads and sends an image.
    async fn send_image(&self, conversation_id: &str, image: &ImageContent);
    /// Reacts to a message.
    async fn send_reaction(&self, conversation_id: &str, message_id: &str, reaction: Reaction);
    /// Accepts or declines an invitation into a conversation.
    ///
    /// Returns whether the bot joined or left the conversation.
    async fn send_connection_response(&self, conversation_id: &str, accept: bool) -> bool;
    /// Shares a location.
    async fn send_location(&self, conversation_id: &str, location: &LocationContent);
    /// Shows or hides the typing indicator of the bot.
    async fn send_typing(&self, conversation_id: &str, active: bool);
    /// Marks a message as read.
    async fn send_confirmation(&self, conversation_id: &str, message_id: &str);
}
