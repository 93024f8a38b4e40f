//! Sync loop translating Matrix events into [`InboundEvent`]s.
//!
//! Invitations, room messages and typing notifications are turned into
//! transport independent events and pushed to the router's channel. Events
//! sent by the bot itself are dropped here.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use log::{debug, error, info, warn};
use matrix_sdk::{
    Client, LoopCtrl, Room, RoomState,
    config::SyncSettings,
    ruma::{
        OwnedRoomId,
        api::client::filter::FilterDefinition,
        events::{
            room::{
                member::{MembershipState, StrippedRoomMemberEvent},
                message::{ImageMessageEventContent, MessageType, OriginalSyncRoomMessageEvent},
            },
            typing::SyncTypingEvent,
        },
    },
};
use tokio::{
    sync::mpsc::UnboundedSender,
    time::{Duration, sleep},
};

use crate::{
    events::{EventPayload, InboundEvent},
    matrix::session::SessionStore,
    sink::{ImageContent, LocationContent},
};

/// Pause between two failed initial syncs.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Users typing in each room at the last typing notification.
type TypingState = Arc<Mutex<HashMap<OwnedRoomId, Vec<String>>>>;

pub struct SyncLoop {
    client: Client,
    store: SessionStore,
    events: UnboundedSender<InboundEvent>,
}

fn forward(events: &UnboundedSender<InboundEvent>, event: InboundEvent) {
    if events.send(event).is_err() {
        warn!("event router stopped, dropping event");
    }
}

impl SyncLoop {
    pub fn new(client: &Client, store: &SessionStore, events: UnboundedSender<InboundEvent>) -> Self {
        SyncLoop {
            client: client.clone(),
            store: store.clone(),
            events,
        }
    }

    pub async fn run(&self) -> Result<()> {
        info!("start syncing");

        // Registered before the first sync to catch invitations received
        // while offline
        let events = self.events.clone();
        self.client.add_event_handler(
            move |member: StrippedRoomMemberEvent, client: Client, room: Room| {
                let events = events.clone();
                async move { on_invite(member, client, room, &events) }
            },
        );

        let filter = FilterDefinition::with_lazy_loading();
        let mut settings = SyncSettings::default().filter(filter.into());
        if let Some(token) = self.store.sync_token() {
            settings = settings.token(token);
        }

        let response = loop {
            match self.client.sync_once(settings.clone()).await {
                Ok(response) => break response,
                Err(err) => {
                    error!("initial sync failed, retrying: {err}");
                    sleep(RETRY_DELAY).await;
                }
            }
        };
        self.persist_token(response.next_batch.clone()).await;
        settings = settings.token(response.next_batch);

        // Messages are only handled from here, the first sync replays old ones
        let events = self.events.clone();
        self.client.add_event_handler(
            move |event: OriginalSyncRoomMessageEvent, client: Client, room: Room| {
                let events = events.clone();
                async move { on_room_message(event, client, room, &events).await }
            },
        );

        let events = self.events.clone();
        let typing: TypingState = Arc::default();
        self.client.add_event_handler(
            move |event: SyncTypingEvent, client: Client, room: Room| {
                let events = events.clone();
                let typing = Arc::clone(&typing);
                async move { on_typing(event, client, room, &typing, &events) }
            },
        );

        self.client
            .sync_with_result_callback(settings, |result| async move {
                let response = result?;
                self.persist_token(response.next_batch).await;
                Ok(LoopCtrl::Continue)
            })
            .await?;

        Ok(())
    }

    async fn persist_token(&self, token: String) {
        if let Err(err) = self.store.save_sync_token(token).await {
            error!("failed to persist sync token: {err:#}");
        }
    }
}

fn is_own(client: &Client, user_id: &str) -> bool {
    client
        .user_id()
        .is_some_and(|own| own.as_str() == user_id)
}

fn on_invite(
    member: StrippedRoomMemberEvent,
    client: Client,
    room: Room,
    events: &UnboundedSender<InboundEvent>,
) {
    if member.content.membership != MembershipState::Invite
        || !is_own(&client, member.state_key.as_str())
    {
        return;
    }

    debug!("invited to {} by {}", room.room_id(), member.sender);
    forward(
        events,
        InboundEvent {
            conversation_id: room.room_id().to_string(),
            sender_id: member.sender.to_string(),
            message_id: String::new(),
            payload: EventPayload::ConnectionRequest,
        },
    );
}

async fn download_image(client: &Client, content: &ImageMessageEventContent) -> Option<ImageContent> {
    match client.media().get_file(content, true).await {
        Ok(Some(data)) => {
            let mime = content.info.as_ref().and_then(|info| info.mimetype.as_deref());
            Some(ImageContent::from_download(&content.body, mime, data))
        }
        Ok(None) => {
            warn!("image {} has no content", content.body);
            None
        }
        Err(err) => {
            error!("failed to download image {}: {err:?}", content.body);
            None
        }
    }
}

async fn on_room_message(
    event: OriginalSyncRoomMessageEvent,
    client: Client,
    room: Room,
    events: &UnboundedSender<InboundEvent>,
) {
    if room.state() != RoomState::Joined || is_own(&client, event.sender.as_str()) {
        return;
    }

    let payload = match event.content.msgtype {
        MessageType::Text(content) => EventPayload::Text { text: content.body },
        MessageType::Image(content) => match download_image(&client, &content).await {
            Some(image) => EventPayload::Image(image),
            None => return,
        },
        MessageType::Location(content) => EventPayload::Location(LocationContent {
            description: content.body,
            geo_uri: content.geo_uri,
        }),
        other => {
            debug!("ignoring {} message", other.msgtype());
            return;
        }
    };

    forward(
        events,
        InboundEvent {
            conversation_id: room.room_id().to_string(),
            sender_id: event.sender.to_string(),
            message_id: event.event_id.to_string(),
            payload,
        },
    );
}

/// Users who started (`true`) or stopped (`false`) typing between two
/// notifications.
pub fn typing_changes(previous: &[String], current: &[String]) -> Vec<(String, bool)> {
    let started = current
        .iter()
        .filter(|user| !previous.contains(user))
        .map(|user| (user.clone(), true));
    let stopped = previous
        .iter()
        .filter(|user| !current.contains(user))
        .map(|user| (user.clone(), false));

    started.chain(stopped).collect()
}

fn on_typing(
    event: SyncTypingEvent,
    client: Client,
    room: Room,
    typing: &TypingState,
    events: &UnboundedSender<InboundEvent>,
) {
    let current: Vec<String> = event
        .content
        .user_ids
        .iter()
        .map(|user| user.to_string())
        .filter(|user| !is_own(&client, user))
        .collect();

    let changes = {
        let Ok(mut typing) = typing.lock() else {
            error!("typing state poisoned");
            return;
        };
        let previous = typing
            .insert(room.room_id().to_owned(), current.clone())
            .unwrap_or_default();
        typing_changes(&previous, &current)
    };

    for (sender_id, active) in changes {
        forward(
            events,
            InboundEvent {
                conversation_id: room.room_id().to_string(),
                sender_id,
                message_id: String::new(),
                payload: EventPayload::Typing { active },
            },
        );
    }
}
