//! Inbound event routing.
//!
//! The [`EventRouter`] consumes the events produced by the Matrix sync loop
//! one at a time. Each event type has exactly one handling branch: text goes
//! to the dispatcher, invitations are accepted with the help text, media and
//! typing go to the bot's pass-through hooks.

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    bots::Bot,
    commands::dispatcher::Dispatcher,
    events::{EventPayload, InboundEvent},
    sink::MessageSink,
};

pub struct EventRouter<B: Bot, S: MessageSink> {
    dispatcher: Dispatcher<B>,
    sink: S,
}

impl<B: Bot, S: MessageSink> EventRouter<B, S> {
    pub fn new(dispatcher: Dispatcher<B>, sink: S) -> Self {
        EventRouter { dispatcher, sink }
    }

    /// Handles events until the channel closes.
    ///
    /// Events are processed strictly in order, an event is fully handled
    /// before the next one is read.
    pub async fn run(mut self, mut events: UnboundedReceiver<InboundEvent>) {
        info!("{} bot ready", self.dispatcher.bot().name());

        while let Some(event) = events.recv().await {
            self.route(event).await;
        }

        info!("event channel closed");
    }

    /// Handles one event.
    pub async fn route(&mut self, event: InboundEvent) {
        let InboundEvent {
            conversation_id,
            sender_id,
            message_id,
            payload,
        } = event;
        debug!(
            "{} event from {sender_id} in {conversation_id}",
            payload.kind()
        );

        if self.dispatcher.bot().confirms_messages() && payload.is_confirmable() {
            self.sink
                .send_confirmation(&conversation_id, &message_id)
                .await;
        }

        match payload {
            EventPayload::Text { text } => {
                self.dispatcher
                    .handle_text(&self.sink, &conversation_id, &sender_id, &message_id, &text)
                    .await;
            }
            EventPayload::ConnectionRequest => {
                info!("accepting invitation from {sender_id} to {conversation_id}");
                if !self
                    .sink
                    .send_connection_response(&conversation_id, true)
                    .await
                {
                    warn!("could not join {conversation_id}, skipping help");
                    return;
                }
                self.sink
                    .send_text(&conversation_id, self.dispatcher.help_text())
                    .await;
            }
            EventPayload::Image(image) => {
                self.dispatcher
                    .bot()
                    .on_image(&self.sink, &conversation_id, &image)
                    .await;
            }
            EventPayload::Location(location) => {
                self.dispatcher
                    .bot()
                    .on_location(&self.sink, &conversation_id, &location)
                    .await;
            }
            EventPayload::Typing { active } => {
                self.dispatcher
                    .bot()
                    .on_typing(&self.sink, &conversation_id, active)
                    .await;
            }
        }
    }
}
