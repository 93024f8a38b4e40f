//! BambooHR bot: tells who is out today and echoes everything else.

use chrono::Utc;

use crate::{
    bots::{Bot, BotContext, common},
    commands::{
        pending::PendingEntry,
        table::{CommandDefinition, CommandTable},
    },
    services::{
        ServiceError,
        bamboohr::{TimeOff, TimeOffRequester},
    },
    sink::{ImageContent, LocationContent, MessageSink},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BambooHrCommand {
    Help,
    Out,
    Uptime,
    Feedback,
}

pub struct BambooHrBot<R: TimeOffRequester> {
    requester: R,
}

impl<R: TimeOffRequester> BambooHrBot<R> {
    pub fn new(requester: R) -> Self {
        BambooHrBot { requester }
    }
}

fn last_name(name: &str) -> &str {
    name.split_whitespace().last().unwrap_or(name)
}

/// Names of the people out, sorted by last name.
pub fn format_whos_out(entries: &[TimeOff]) -> String {
    let mut names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
    names.sort_by(|a, b| last_name(a).cmp(last_name(b)));
    format!("{} people are out today: {}", names.len(), names.join(", "))
}

impl<R: TimeOffRequester> Bot for BambooHrBot<R> {
    type Command = BambooHrCommand;

    fn name(&self) -> &'static str {
        "bamboohr"
    }

    fn commands(&self) -> CommandTable<BambooHrCommand> {
        CommandTable::new(vec![
            CommandDefinition::new("help", "Display this message.", BambooHrCommand::Help),
            CommandDefinition::new("out", "See who is out today.", BambooHrCommand::Out),
            CommandDefinition::new(
                "uptime",
                "Get the current uptime of this bot.",
                BambooHrCommand::Uptime,
            ),
            CommandDefinition::with_argument(
                "feedback",
                "Send feedback to the developer.",
                "text",
                BambooHrCommand::Feedback,
            ),
        ])
    }

    fn help_text(&self, commands: &CommandTable<BambooHrCommand>) -> String {
        format!(
            "**Hello!** 😎 This is BambooHR bot v{} speaking.\n\nSend me anything and I will send it right back!\n\nFurther available commands:\n{}\n\nMore information about this bot: https://github.com/florianduros/menagerie.",
            env!("CARGO_PKG_VERSION"),
            commands.format_commands()
        )
    }

    fn confirms_messages(&self) -> bool {
        true
    }

    async fn answer<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, BambooHrCommand>,
        command: BambooHrCommand,
        argument: Option<String>,
    ) -> Result<(), ServiceError> {
        match command {
            BambooHrCommand::Help => common::help(ctx).await,
            BambooHrCommand::Uptime => common::uptime(ctx).await,
            BambooHrCommand::Feedback => common::feedback(ctx, command, argument).await,
            BambooHrCommand::Out => {
                let entries = self.requester.whos_out(Utc::now().date_naive()).await?;
                ctx.reply(&format_whos_out(&entries)).await;
                ctx.complete();
            }
        }
        Ok(())
    }

    async fn on_plain_text<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, BambooHrCommand>,
        text: &str,
        _pending: Option<PendingEntry<BambooHrCommand>>,
    ) -> Result<(), ServiceError> {
        ctx.reply(text).await;
        Ok(())
    }

    async fn on_unknown_command<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, BambooHrCommand>,
        _raw_token: &str,
        text: &str,
    ) -> Result<(), ServiceError> {
        ctx.reply(text).await;
        Ok(())
    }

    async fn on_image<S: MessageSink>(&self, sink: &S, conversation_id: &str, image: &ImageContent) {
        sink.send_image(conversation_id, image).await;
    }

    async fn on_location<S: MessageSink>(
        &self,
        sink: &S,
        conversation_id: &str,
        location: &LocationContent,
    ) {
        sink.send_location(conversation_id, location).await;
    }

    async fn on_typing<S: MessageSink>(&self, sink: &S, conversation_id: &str, active: bool) {
        sink.send_typing(conversation_id, active).await;
    }
}
