//! Packages bot: searches Bower, npm and crates.io through libraries.io.
//!
//! Results come in pages of ten. When more are available the bot asks
//! whether to continue and remembers the query as a continuation entry; a
//! plain "yes" or "no" then resolves it in [`Bot::on_plain_text`].

use log::debug;

use crate::{
    bots::{Bot, BotContext, common},
    commands::{
        markdown_response::{format_help, format_not_implemented},
        pending::PendingEntry,
        table::{CommandDefinition, CommandTable},
    },
    services::{
        ServiceError,
        libraries_io::{PackageSearcher, Platform, Project, RESULTS_PER_PAGE},
    },
    sink::MessageSink,
};

const SERVICES: &str = "Available services:\n- **/bower**\n- **/npm**\n- **/crates**\n- **/types**";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagesCommand {
    Help,
    Services,
    Bower,
    Npm,
    Crates,
    Types,
    Uptime,
    Feedback,
}

impl PackagesCommand {
    fn platform(&self) -> Option<Platform> {
        match self {
            PackagesCommand::Bower => Some(Platform::Bower),
            PackagesCommand::Npm => Some(Platform::Npm),
            PackagesCommand::Crates => Some(Platform::Cargo),
            _ => None,
        }
    }
}

pub struct PackagesBot<R: PackageSearcher> {
    searcher: R,
}

impl<R: PackageSearcher> PackagesBot<R> {
    pub fn new(searcher: R) -> Self {
        PackagesBot { searcher }
    }

    async fn search<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, PackagesCommand>,
        command: PackagesCommand,
        platform: Platform,
        query: String,
        page: u32,
    ) -> Result<(), ServiceError> {
        ctx.send_text(&format!("Searching for \"{query}\" on {platform} ..."))
            .await;

        let results = self.searcher.search(platform, &query, page).await?;
        if results.projects.is_empty() {
            ctx.complete();
            ctx.send_text(&format!("Sorry, I could not find any package for \"{query}\"."))
                .await;
            return Ok(());
        }

        let mut text = format_projects(&results.projects);
        let remaining = results.remaining(page);
        if remaining > 0 {
            text.push_str(&format_more_results(remaining));
            ctx.remember(PendingEntry::continuation(command, query, page));
        } else {
            ctx.complete();
        }
        ctx.send_text(&text).await;
        Ok(())
    }
}

fn format_project(project: &Project) -> String {
    let stars = match project.stars {
        0 => String::new(),
        1 => ", 1 star".to_owned(),
        n => format!(", {n} stars"),
    };
    let details = match project.language.as_deref() {
        Some(language) if !language.is_empty() && !stars.is_empty() => {
            format!(" ({language}{stars})")
        }
        _ => String::new(),
    };
    let homepage = match project.homepage.as_deref() {
        Some(homepage) if !homepage.is_empty() => format!(" ({homepage})"),
        _ => String::new(),
    };

    format!(
        "\n- **{}**{details}: {}{homepage}",
        project.name,
        project.description.as_deref().unwrap_or_default()
    )
}

pub fn format_projects(projects: &[Project]) -> String {
    projects.iter().map(format_project).collect()
}

/// Question appended to a page when `remaining` results are left.
pub fn format_more_results(remaining: u64) -> String {
    let next = remaining.min(u64::from(RESULTS_PER_PAGE));
    if remaining == 1 {
        format!(
            "\n\nThere is 1 more result. Would you like to see {next} more? Answer with \"yes\" or \"no\"."
        )
    } else {
        format!(
            "\n\nThere are {remaining} more results. Would you like to see {next} more? Answer with \"yes\" or \"no\"."
        )
    }
}

impl<R: PackageSearcher> Bot for PackagesBot<R> {
    type Command = PackagesCommand;

    fn name(&self) -> &'static str {
        "packages"
    }

    fn commands(&self) -> CommandTable<PackagesCommand> {
        CommandTable::new(vec![
            CommandDefinition::new("help", "Display this message.", PackagesCommand::Help),
            CommandDefinition::new(
                "services",
                "Display all available services.",
                PackagesCommand::Services,
            ),
            CommandDefinition::with_argument(
                "bower",
                "Search for a package on Bower.",
                "package",
                PackagesCommand::Bower,
            ),
            CommandDefinition::with_argument(
                "npm",
                "Search for a package on npm.",
                "package",
                PackagesCommand::Npm,
            ),
            CommandDefinition::with_argument(
                "crates",
                "Search for a package on crates.io.",
                "package",
                PackagesCommand::Crates,
            ),
            CommandDefinition::with_argument(
                "types",
                "Search for type definitions on TypeSearch.",
                "package",
                PackagesCommand::Types,
            ),
            CommandDefinition::new(
                "uptime",
                "Get the current uptime of this bot.",
                PackagesCommand::Uptime,
            ),
            CommandDefinition::with_argument(
                "feedback",
                "Send feedback to the developer.",
                "text",
                PackagesCommand::Feedback,
            ),
        ])
    }

    fn help_text(&self, commands: &CommandTable<PackagesCommand>) -> String {
        format_help(
            &format!(
                "**Hello!** 😎 This is packages bot v{} speaking.\nHere you can search for all the packages on Bower, npm, TypeSearch and crates.io. 📦",
                env!("CARGO_PKG_VERSION")
            ),
            &commands.format_commands(),
            "More information about this bot: https://github.com/florianduros/menagerie.",
        )
    }

    async fn answer<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, PackagesCommand>,
        command: PackagesCommand,
        argument: Option<String>,
    ) -> Result<(), ServiceError> {
        match command {
            PackagesCommand::Help => common::help(ctx).await,
            PackagesCommand::Uptime => common::uptime(ctx).await,
            PackagesCommand::Feedback => common::feedback(ctx, command, argument).await,
            PackagesCommand::Services => ctx.reply(SERVICES).await,
            PackagesCommand::Types => ctx.reply(&format_not_implemented("types")).await,
            PackagesCommand::Bower | PackagesCommand::Npm | PackagesCommand::Crates => {
                let Some(platform) = command.platform() else {
                    return Ok(());
                };
                match argument {
                    None => {
                        ctx.ask(
                            command,
                            &format!("What would you like to search on {platform}?"),
                        )
                        .await
                    }
                    Some(query) => {
                        self.search(ctx, command, platform, query, 1).await?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn on_plain_text<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, PackagesCommand>,
        text: &str,
        pending: Option<PendingEntry<PackagesCommand>>,
    ) -> Result<(), ServiceError> {
        let Some(entry) = pending else {
            return Ok(());
        };

        match text.to_lowercase().as_str() {
            "yes" => {
                let (Some(platform), Some(query)) = (entry.command.platform(), entry.argument)
                else {
                    return Ok(());
                };
                ctx.react().await;
                self.search(ctx, entry.command, platform, query, entry.page + 1)
                    .await
            }
            "no" => {
                ctx.react().await;
                ctx.complete();
                ctx.send_text("Okay.").await;
                Ok(())
            }
            _ => {
                debug!("ignoring text while a continuation is pending");
                Ok(())
            }
        }
    }
}
