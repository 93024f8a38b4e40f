//! Echo bot: sends everything right back.

use crate::{
    bots::{Bot, BotContext, common},
    commands::{
        markdown_response::format_help,
        pending::PendingEntry,
        table::{CommandDefinition, CommandTable},
    },
    services::ServiceError,
    sink::{ImageContent, LocationContent, MessageSink},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoCommand {
    Help,
    Uptime,
    Feedback,
}

pub struct EchoBot;

impl Bot for EchoBot {
    type Command = EchoCommand;

    fn name(&self) -> &'static str {
        "echo"
    }

    fn commands(&self) -> CommandTable<EchoCommand> {
        CommandTable::new(vec![
            CommandDefinition::new("help", "Display this message.", EchoCommand::Help),
            CommandDefinition::new(
                "uptime",
                "Get the current uptime of this bot.",
                EchoCommand::Uptime,
            ),
            CommandDefinition::with_argument(
                "feedback",
                "Send feedback to the developer.",
                "text",
                EchoCommand::Feedback,
            ),
        ])
    }

    fn help_text(&self, commands: &CommandTable<EchoCommand>) -> String {
        format_help(
            &format!(
                "**Hello!** 😎 This is Echo bot v{} speaking.\n\nSend me anything and I will send it right back!",
                env!("CARGO_PKG_VERSION")
            ),
            &commands.format_commands(),
            "More information about this bot: https://github.com/florianduros/menagerie.",
        )
    }

    fn confirms_messages(&self) -> bool {
        true
    }

    async fn answer<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, EchoCommand>,
        command: EchoCommand,
        argument: Option<String>,
    ) -> Result<(), ServiceError> {
        match command {
            EchoCommand::Help => common::help(ctx).await,
            EchoCommand::Uptime => common::uptime(ctx).await,
            EchoCommand::Feedback => common::feedback(ctx, command, argument).await,
        }
        Ok(())
    }

    async fn on_plain_text<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, EchoCommand>,
        text: &str,
        _pending: Option<PendingEntry<EchoCommand>>,
    ) -> Result<(), ServiceError> {
        ctx.send_text(text).await;
        Ok(())
    }

    async fn on_unknown_command<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, EchoCommand>,
        _raw_token: &str,
        text: &str,
    ) -> Result<(), ServiceError> {
        ctx.send_text(text).await;
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
