//! XKCD bot: fetches comics from xkcd.com.

use log::info;

use crate::{
    bots::{Bot, BotContext, common},
    commands::{
        markdown_response::format_help,
        table::{CommandDefinition, CommandTable},
    },
    services::{
        ServiceError,
        xkcd::{Comic, ComicRequester},
    },
    sink::MessageSink,
};

const COMIC_QUESTION: &str =
    "Which comic would you like to see? Answer with a number, \"random\" or \"latest\"";
const INVALID_NUMBER: &str = "Invalid number specified.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XkcdCommand {
    Help,
    Latest,
    Comic,
    Uptime,
    Random,
    Feedback,
}

pub struct XkcdBot<R: ComicRequester> {
    requester: R,
}

impl<R: ComicRequester> XkcdBot<R> {
    pub fn new(requester: R) -> Self {
        XkcdBot { requester }
    }

    /// Resolves the argument of `/comic`.
    async fn comic_by_argument<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, XkcdCommand>,
        argument: &str,
    ) -> Result<(), ServiceError> {
        let comic = match argument.to_lowercase().as_str() {
            "latest" => self.requester.get_latest().await?,
            "random" => self.requester.get_random().await?,
            _ => {
                let Some(number) = argument.parse::<u32>().ok().filter(|n| *n >= 1) else {
                    ctx.reply(INVALID_NUMBER).await;
                    return Ok(());
                };

                match self.requester.get_comic(number).await {
                    Ok(comic) => comic,
                    Err(ServiceError::NotFound) => {
                        ctx.reply(&format!(
                            "Sorry, I could not find a comic by ID \"{argument}\"."
                        ))
                        .await;
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        send_comic(ctx, comic).await;
        Ok(())
    }
}

async fn send_comic<S: MessageSink>(ctx: &mut BotContext<'_, S, XkcdCommand>, comic: Comic) {
    info!("sending comic #{} to {}", comic.number, ctx.sender_id);

    ctx.send_text(&format!(
        "Here is your XKCD comic #{0} (https://xkcd.com/{0}) titled \"{1}\":",
        comic.number, comic.title
    ))
    .await;
    ctx.send_image(&comic.image).await;
    ctx.complete();
    ctx.send_text(&format!("> {}", comic.comment)).await;
}

impl<R: ComicRequester> Bot for XkcdBot<R> {
    type Command = XkcdCommand;

    fn name(&self) -> &'static str {
        "xkcd"
    }

    fn commands(&self) -> CommandTable<XkcdCommand> {
        CommandTable::new(vec![
            CommandDefinition::new("help", "Display this message.", XkcdCommand::Help),
            CommandDefinition::new("latest", "Get the latest comic.", XkcdCommand::Latest),
            CommandDefinition::with_argument("comic", "Get a comic.", "number", XkcdCommand::Comic),
            CommandDefinition::new(
                "uptime",
                "Get the current uptime of this bot.",
                XkcdCommand::Uptime,
            ),
            CommandDefinition::new("random", "Get a random comic.", XkcdCommand::Random),
            CommandDefinition::with_argument(
                "feedback",
                "Send feedback to the developer.",
                "text",
                XkcdCommand::Feedback,
            ),
        ])
    }

    fn help_text(&self, commands: &CommandTable<XkcdCommand>) -> String {
        format_help(
            &format!(
                "**Hello!** 😎 This is XKCD bot v{} speaking.",
                env!("CARGO_PKG_VERSION")
            ),
            &commands.format_commands(),
            "Please also visit https://xkcd.com.",
        )
    }

    async fn answer<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, XkcdCommand>,
        command: XkcdCommand,
        argument: Option<String>,
    ) -> Result<(), ServiceError> {
        match command {
            XkcdCommand::Help => common::help(ctx).await,
            XkcdCommand::Uptime => common::uptime(ctx).await,
            XkcdCommand::Feedback => common::feedback(ctx, command, argument).await,
            XkcdCommand::Latest => {
                let comic = self.requester.get_latest().await?;
                send_comic(ctx, comic).await;
            }
            XkcdCommand::Random => {
                let comic = self.requester.get_random().await?;
                send_comic(ctx, comic).await;
            }
            XkcdCommand::Comic => match argument {
                None => ctx.ask(command, COMIC_QUESTION).await,
                Some(argument) => self.comic_by_argument(ctx, &argument).await?,
            },
        }
        Ok(())
    }
}
