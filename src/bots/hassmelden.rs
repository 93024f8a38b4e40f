//! Hassmelden bot: takes reports of hate speech.
//!
//! The bot talks German to its users, only `/help` and `/hassmelden` exist.

use crate::{
    bots::{Bot, BotContext, common},
    commands::table::{CommandDefinition, CommandTable},
    services::{
        ServiceError,
        report::{LogReporter, Report, Reporter},
    },
    sink::MessageSink,
};

const HELP_TEXT: &str = "Hallo!\n\nSchön, dass Du da bist!\n\nDu kannst über diesen Bot Links melden, von denen du denkst, dass sie strafrechtlich relevant sein könnten. Wir kümmern uns dann um den Rest!\n\nFür mehr Vernunft im Netz,\nmit ❤️, ✊ & 😉";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HassmeldenCommand {
    Help,
    Report,
}

pub struct HassmeldenBot<R: Reporter = LogReporter> {
    reporter: R,
}

impl HassmeldenBot<LogReporter> {
    pub fn new() -> Self {
        HassmeldenBot {
            reporter: LogReporter,
        }
    }
}

impl Default for HassmeldenBot<LogReporter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Reporter> HassmeldenBot<R> {
    pub fn with_reporter(reporter: R) -> Self {
        HassmeldenBot { reporter }
    }
}

impl<R: Reporter> Bot for HassmeldenBot<R> {
    type Command = HassmeldenCommand;

    fn name(&self) -> &'static str {
        "hassmelden"
    }

    fn commands(&self) -> CommandTable<HassmeldenCommand> {
        CommandTable::new(vec![
            CommandDefinition::new("help", "Display this message.", HassmeldenCommand::Help),
            CommandDefinition::new(
                "hassmelden",
                "Report hate speech",
                HassmeldenCommand::Report,
            ),
        ])
    }

    fn help_text(&self, _commands: &CommandTable<HassmeldenCommand>) -> String {
        HELP_TEXT.to_owned()
    }

    async fn answer<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, HassmeldenCommand>,
        command: HassmeldenCommand,
        _argument: Option<String>,
    ) -> Result<(), ServiceError> {
        match command {
            HassmeldenCommand::Help => common::help(ctx).await,
            HassmeldenCommand::Report => {
                let report = Report {
                    conversation_id: ctx.conversation_id.to_owned(),
                    reporter_id: ctx.sender_id.to_owned(),
                };
                self.reporter.report(&report).await?;
                ctx.complete();
                ctx.reply("Reported.").await;
            }
        }
        Ok(())
    }
}
