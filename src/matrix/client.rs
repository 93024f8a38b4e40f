//! [`MessageSink`] implementation on top of the Matrix SDK.
//!
//! Identifiers arrive as plain strings from the router. Parsing failures and
//! delivery errors are logged and the message is dropped.

use anyhow::Result;
use log::{error, info, warn};
use matrix_sdk::{
    Client, Room,
    attachment::AttachmentConfig,
    ruma::{
        EventId, OwnedEventId, RoomId, UserId,
        api::client::receipt::create_receipt::v3::ReceiptType,
        events::{
            MessageLikeEventContent,
            reaction::ReactionEventContent,
            receipt::ReceiptThread,
            relation::Annotation,
            room::message::{
                AddMentions, ForwardThread, LocationMessageEventContent, MessageType,
                ReplyMetadata, RoomMessageEventContent,
            },
        },
    },
};
use tokio::{
    sync::mpsc::UnboundedSender,
    time::{Duration, sleep},
};

use crate::{
    events::InboundEvent,
    matrix::{UserCredentials, login, session::SessionStore, sync::SyncLoop},
    sink::{ImageContent, LocationContent, MessageSink, Reaction},
};

/// Longest pause between two attempts to join a room.
const MAX_JOIN_DELAY: u64 = 64;

/// Logged in Matrix account.
///
/// Cloning is cheap, clones share the same SDK client.
#[derive(Clone)]
pub struct MatrixClient {
    client: Client,
    store: SessionStore,
}

impl MatrixClient {
    /// Logs in or restores the session kept in `session_dir`.
    pub async fn connect(credentials: &UserCredentials, session_dir: &str) -> Result<Self> {
        let store = SessionStore::open(session_dir).await?;
        let client = login::connect(credentials, &store).await?;

        Ok(MatrixClient { client, store })
    }

    /// Runs the sync loop, pushing every relevant room event to `events`.
    ///
    /// Only returns when syncing fails for good.
    pub async fn sync(&self, events: UnboundedSender<InboundEvent>) -> Result<()> {
        SyncLoop::new(&self.client, &self.store, events).run().await
    }

    fn room(&self, conversation_id: &str) -> Option<Room> {
        let room_id = match RoomId::parse(conversation_id) {
            Ok(room_id) => room_id,
            Err(err) => {
                error!("invalid room id {conversation_id}: {err}");
                return None;
            }
        };

        let room = self.client.get_room(&room_id);
        if room.is_none() {
            warn!("unknown room {conversation_id}");
        }
        room
    }

    async fn send<C: MessageLikeEventContent>(&self, conversation_id: &str, content: C) {
        let Some(room) = self.room(conversation_id) else {
            return;
        };

        if let Err(err) = room.send(content).await {
            error!("failed to send to {conversation_id}: {err:?}");
        }
    }

    async fn join(&self, room: Room) -> bool {
        let mut delay = 2;

        // Synapse may send the invite before the room accepts the join
        // https://github.com/matrix-org/synapse/issues/4345
        while let Err(err) = room.join().await {
            if delay > MAX_JOIN_DELAY {
                error!("giving up joining {}: {err:?}", room.room_id());
                return false;
            }

            warn!(
                "failed to join {} ({err:?}), retrying in {delay}s",
                room.room_id()
            );
            sleep(Duration::from_secs(delay)).await;
            delay *= 2;
        }

        info!("joined {}", room.room_id());
        true
    }
}

fn parse_event_id(message_id: &str) -> Option<OwnedEventId> {
    match EventId::parse(message_id) {
        Ok(event_id) => Some(event_id),
        Err(err) => {
            error!("invalid event id {message_id}: {err}");
            None
        }
    }
}

impl MessageSink for MatrixClient {
    async fn send_text(&self, conversation_id: &str, text: &str) {
        self.send(conversation_id, RoomMessageEventContent::text_markdown(text))
            .await;
    }

    async fn send_reply(&self, conversation_id: &str, sender_id: &str, message_id: &str, text: &str) {
        let content = RoomMessageEventContent::text_markdown(text);
        let sender = UserId::parse(sender_id);

        let content = match (sender, parse_event_id(message_id)) {
            (Ok(sender), Some(event_id)) => content.make_reply_to(
                ReplyMetadata::new(&event_id, &sender, None),
                ForwardThread::No,
                AddMentions::No,
            ),
            // Still answer, without quoting
            _ => content,
        };

        self.send(conversation_id, content).await;
    }

    async fn send_image(&self, conversation_id: &str, image: &ImageContent) {
        let Some(room) = self.room(conversation_id) else {
            return;
        };

        if let Err(err) = room
            .send_attachment(
                image.name.clone(),
                &image.mime,
                image.data.clone(),
                AttachmentConfig::new(),
            )
            .await
        {
            error!("failed to send image to {conversation_id}: {err:?}");
        }
    }

    async fn send_reaction(&self, conversation_id: &str, message_id: &str, reaction: Reaction) {
        let Some(event_id) = parse_event_id(message_id) else {
            return;
        };

        let content =
            ReactionEventContent::new(Annotation::new(event_id, reaction.key().to_owned()));
        self.send(conversation_id, content).await;
    }

    async fn send_connection_response(&self, conversation_id: &str, accept: bool) -> bool {
        let Some(room) = self.room(conversation_id) else {
            return false;
        };

        if accept {
            return self.join(room).await;
        }

        match room.leave().await {
            Ok(()) => true,
            Err(err) => {
                error!("failed to leave {conversation_id}: {err:?}");
                false
            }
        }
    }

    async fn send_location(&self, conversation_id: &str, location: &LocationContent) {
        let content = RoomMessageEventContent::new(MessageType::Location(
            LocationMessageEventContent::new(
                location.description.clone(),
                location.geo_uri.clone(),
            ),
        ));
        self.send(conversation_id, content).await;
    }

    async fn send_typing(&self, conversation_id: &str, active: bool) {
        let Some(room) = self.room(conversation_id) else {
            return;
        };

        if let Err(err) = room.typing_notice(active).await {
            warn!("failed to update typing in {conversation_id}: {err:?}");
        }
    }

    async fn send_confirmation(&self, conversation_id: &str, message_id: &str) {
        let (Some(room), Some(event_id)) =
            (self.room(conversation_id), parse_event_id(message_id))
        else {
            return;
        };

        if let Err(err) = room
            .send_single_receipt(ReceiptType::Read, ReceiptThread::Unthreaded, event_id)
            .await
        {
            warn!("failed to confirm {message_id}: {err:?}");
        }
    }
}
