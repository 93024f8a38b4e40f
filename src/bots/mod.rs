//! Bot personalities.
//!
//! A bot is a command table plus the handlers executing those commands. The
//! [`Bot`] trait is the seam between the generic
//! [`Dispatcher`](crate::commands::dispatcher::Dispatcher) and the per-bot
//! logic: the dispatcher decides which command runs, the bot runs it.
//!
//! # Available bots
//!
//! | Bot | Commands | Service |
//! |-----|----------|---------|
//! | [`echo`] | help, uptime, feedback | none, echoes everything |
//! | [`xkcd`] | help, latest, comic, random, uptime, feedback | xkcd.com |
//! | [`weather`] | help, weather, forecast, uptime, feedback | OpenWeatherMap |
//! | [`packages`] | help, services, bower, npm, crates, types, uptime, feedback | libraries.io |
//! | [`imgflip`] | help, caption, memes, uptime, feedback | Imgflip |
//! | [`absence`] | help, absences, uptime, feedback | absence.io |
//! | [`bamboohr`] | help, out, uptime, feedback | BambooHR |
//! | [`hassmelden`] | help, hassmelden | report log |
//!
//! Handlers receive a [`BotContext`] giving access to the sink, the pending
//! cache of the dispatcher and the conversation the message came from.

pub mod absence;
pub mod bamboohr;
pub(crate) mod common;
pub mod echo;
pub mod hassmelden;
pub mod imgflip;
pub mod packages;
pub mod weather;
pub mod xkcd;

use std::{fmt::Debug, time::Instant};

use crate::{
    commands::{
        markdown_response::format_unknown_command,
        pending::{PendingCache, PendingEntry},
        table::CommandTable,
    },
    services::ServiceError,
    sink::{ImageContent, LocationContent, MessageSink, Reaction},
};

/// Settings shared by every bot.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Conversation receiving `/feedback` messages
    pub feedback_conversation: Option<String>,
    /// Start of the process, for `/uptime`
    pub started_at: Instant,
}

impl BotSettings {
    pub fn new(feedback_conversation: Option<String>) -> Self {
        BotSettings {
            feedback_conversation,
            started_at: Instant::now(),
        }
    }
}

/// Everything a handler needs to answer one message.
pub struct BotContext<'a, S, C> {
    pub sink: &'a S,
    pub pending: &'a mut PendingCache<C>,
    pub settings: &'a BotSettings,
    pub help_text: &'a str,
    pub conversation_id: &'a str,
    pub sender_id: &'a str,
    pub message_id: &'a str,
}

impl<S: MessageSink, C: Clone> BotContext<'_, S, C> {
    /// Replies to the message being handled.
    pub async fn reply(&self, text: &str) {
        self.sink
            .send_reply(self.conversation_id, self.sender_id, self.message_id, text)
            .await;
    }

    /// Sends a message to the conversation without quoting.
    pub async fn send_text(&self, text: &str) {
        self.sink.send_text(self.conversation_id, text).await;
    }

    pub async fn send_image(&self, image: &ImageContent) {
        self.sink.send_image(self.conversation_id, image).await;
    }

    /// Likes the message being handled.
    pub async fn react(&self) {
        self.sink
            .send_reaction(self.conversation_id, self.message_id, Reaction::Like)
            .await;
    }

    /// Asks for the missing argument of `command`.
    ///
    /// The next plain message of the conversation becomes the argument.
    pub async fn ask(&mut self, command: C, question: &str) {
        self.pending
            .set(self.conversation_id, PendingEntry::awaiting(command));
        self.reply(question).await;
    }

    /// Stores a continuation for the conversation.
    pub fn remember(&mut self, entry: PendingEntry<C>) {
        self.pending.set(self.conversation_id, entry);
    }

    /// Marks the conversation as no longer waiting for anything.
    pub fn complete(&mut self) {
        self.pending.clear(self.conversation_id);
    }
}

/// A command-driven bot.
///
/// Only [`Bot::answer`] is mandatory. The other hooks default to the
/// behavior shared by most bots: unknown commands get an apology, plain text
/// and media are ignored.
pub trait Bot {
    /// Exhaustive set of commands of the bot
    type Command: Copy + Eq + Debug;

    /// Name used in log lines.
    fn name(&self) -> &'static str;

    /// Command table of the bot.
    fn commands(&self) -> CommandTable<Self::Command>;

    /// Help text, built once from the command table.
    fn help_text(&self, commands: &CommandTable<Self::Command>) -> String;

    /// Whether text, images and locations are marked as read.
    fn confirms_messages(&self) -> bool {
        false
    }

    /// Runs `command` with its effective argument.
    async fn answer<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, Self::Command>,
        command: Self::Command,
        argument: Option<String>,
    ) -> Result<(), ServiceError>;

    /// Handles text that is not a command and answers no pending question.
    ///
    /// `pending` is the continuation entry of the conversation, if any.
    async fn on_plain_text<S: MessageSink>(
        &self,
        _ctx: &mut BotContext<'_, S, Self::Command>,
        _text: &str,
        _pending: Option<PendingEntry<Self::Command>>,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Handles a `/token` matching no command.
    async fn on_unknown_command<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, Self::Command>,
        raw_token: &str,
        _text: &str,
    ) -> Result<(), ServiceError> {
        ctx.reply(&format_unknown_command(raw_token)).await;
        Ok(())
    }

    async fn on_image<S: MessageSink>(&self, _sink: &S, _conversation_id: &str, _image: &ImageContent) {}

    async fn on_location<S: MessageSink>(
        &self,
        _sink: &S,
        _conversation_id: &str,
        _location: &LocationContent,
    ) {
    }

    async fn on_typing<S: MessageSink>(&self, _sink: &S, _conversation_id: &str, _active: bool) {}
}
