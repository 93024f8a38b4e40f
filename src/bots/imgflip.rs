//! Imgflip bot: lists popular meme templates and captions them.

use std::sync::LazyLock;

use log::info;
use regex::Regex;

use crate::{
    bots::{Bot, BotContext, common},
    commands::{
        markdown_response::format_help,
        table::{CommandDefinition, CommandTable},
    },
    services::{
        ServiceError,
        imgflip::{Caption, MemeRequester},
    },
    sink::MessageSink,
};

const CAPTION_QUESTION: &str =
    "Please enter the template id, text 1 and text 2 separated by a space.";
const MEMES_QUESTION: &str = "How many memes would you like to see?";

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)""#).expect("quote pattern is a valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImgflipCommand {
    Help,
    Caption,
    Memes,
    Uptime,
    Feedback,
}

pub struct ImgflipBot<R: MemeRequester> {
    requester: R,
}

impl<R: MemeRequester> ImgflipBot<R> {
    pub fn new(requester: R) -> Self {
        ImgflipBot { requester }
    }
}

/// Splits the `/caption` argument into template id and texts.
///
/// Quoted segments are used when there are any, so texts may contain spaces.
/// Otherwise the argument is split on whitespace. Missing parts are empty.
pub fn parse_caption(argument: &str) -> Caption {
    let quoted: Vec<String> = QUOTED
        .captures_iter(argument)
        .map(|captures| captures[1].to_owned())
        .collect();
    let mut parts = if quoted.is_empty() {
        argument
            .split_whitespace()
            .map(str::to_owned)
            .collect::<Vec<_>>()
            .into_iter()
    } else {
        quoted.into_iter()
    };

    Caption {
        template_id: parts.next().unwrap_or_default(),
        top_text: parts.next().unwrap_or_default(),
        bottom_text: parts.next().unwrap_or_default(),
    }
}

impl<R: MemeRequester> Bot for ImgflipBot<R> {
    type Command = ImgflipCommand;

    fn name(&self) -> &'static str {
        "imgflip"
    }

    fn commands(&self) -> CommandTable<ImgflipCommand> {
        CommandTable::new(vec![
            CommandDefinition::new("help", "Display this message.", ImgflipCommand::Help),
            CommandDefinition::with_argument(
                "caption",
                "Caption a meme (arguments need to be set in quotes).",
                "\"id\" \"First text\" \"second text\"",
                ImgflipCommand::Caption,
            ),
            CommandDefinition::with_argument(
                "memes",
                "Get a list of popular memes that may be captioned.",
                "count",
                ImgflipCommand::Memes,
            ),
            CommandDefinition::new(
                "uptime",
                "Get the current uptime of this bot.",
                ImgflipCommand::Uptime,
            ),
            CommandDefinition::with_argument(
                "feedback",
                "Send feedback to the developer.",
                "text",
                ImgflipCommand::Feedback,
            ),
        ])
    }

    fn help_text(&self, commands: &CommandTable<ImgflipCommand>) -> String {
        format_help(
            &format!(
                "**Hello!** 😎 This is Imgflip bot v{} speaking.",
                env!("CARGO_PKG_VERSION")
            ),
            &commands.format_commands(),
            "Please also visit https://imgflip.com.",
        )
    }

    async fn answer<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, ImgflipCommand>,
        command: ImgflipCommand,
        argument: Option<String>,
    ) -> Result<(), ServiceError> {
        match command {
            ImgflipCommand::Help => common::help(ctx).await,
            ImgflipCommand::Uptime => common::uptime(ctx).await,
            ImgflipCommand::Feedback => common::feedback(ctx, command, argument).await,
            ImgflipCommand::Caption => {
                let Some(argument) = argument else {
                    ctx.ask(command, CAPTION_QUESTION).await;
                    return Ok(());
                };

                let image = self.requester.caption_image(&parse_caption(&argument)).await?;
                info!("sending created meme to {}", ctx.sender_id);
                ctx.send_image(&image).await;
                ctx.complete();
            }
            ImgflipCommand::Memes => {
                let count = argument
                    .and_then(|argument| argument.parse::<usize>().ok())
                    .filter(|count| *count >= 1);
                let Some(count) = count else {
                    ctx.ask(command, MEMES_QUESTION).await;
                    return Ok(());
                };

                let memes = self.requester.top_memes(count).await?;
                info!("sending {} memes to {}", memes.len(), ctx.sender_id);
                ctx.send_text(&format!("Here are the top {} memes:", memes.len()))
                    .await;
                for meme_image in &memes {
                    let meme = &meme_image.meme;
                    ctx.send_text(&format!(
                        "\"{}\": {} boxes, ID: `{}`",
                        meme.name, meme.box_count, meme.id
                    ))
                    .await;
                    ctx.send_image(&meme_image.image).await;
                }
                ctx.complete();
            }
        }
        Ok(())
    }
}
