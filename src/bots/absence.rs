//! Absence bot: lists upcoming absences from absence.io.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};

use crate::{
    bots::{Bot, BotContext, common},
    commands::{
        markdown_response::format_help,
        table::{CommandDefinition, CommandTable},
    },
    services::{
        ServiceError,
        absence_io::{Absence, AbsenceRequester},
    },
    sink::MessageSink,
};

const NO_ABSENCES: &str = "No upcoming absences.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsenceCommand {
    Help,
    Absences,
    Uptime,
    Feedback,
}

pub struct AbsenceBot<R: AbsenceRequester> {
    requester: R,
}

impl<R: AbsenceRequester> AbsenceBot<R> {
    pub fn new(requester: R) -> Self {
        AbsenceBot { requester }
    }
}

/// Weekdays from `begin` included to `end` excluded, at least one.
pub fn working_days(begin: NaiveDate, end: NaiveDate) -> u64 {
    let mut days = 0;
    let mut day = begin;
    while day < end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days += 1;
        }
        match day.checked_add_days(Days::new(1)) {
            Some(next) => day = next,
            None => break,
        }
    }
    days.max(1)
}

fn format_absence(absence: &Absence) -> String {
    let begin = absence.start.date_naive();
    let end = absence.end.date_naive();

    match working_days(begin, end) {
        1 => format!("{} (1 working day)", begin.format("%Y-%m-%d")),
        days => format!(
            "{} - {} ({days} working days)",
            begin.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        ),
    }
}

/// Formats the absences not over at `now`, earliest first.
pub fn format_absences(mut absences: Vec<Absence>, now: DateTime<Utc>) -> String {
    absences.retain(|absence| absence.end >= now);
    if absences.is_empty() {
        return NO_ABSENCES.to_owned();
    }

    absences.sort_by_key(|absence| absence.start);
    absences
        .iter()
        .map(format_absence)
        .collect::<Vec<_>>()
        .join("\n")
}

impl<R: AbsenceRequester> Bot for AbsenceBot<R> {
    type Command = AbsenceCommand;

    fn name(&self) -> &'static str {
        "absence"
    }

    fn commands(&self) -> CommandTable<AbsenceCommand> {
        CommandTable::new(vec![
            CommandDefinition::new("help", "Display this message.", AbsenceCommand::Help),
            CommandDefinition::new(
                "absences",
                "List upcoming absences.",
                AbsenceCommand::Absences,
            ),
            CommandDefinition::new(
                "uptime",
                "Get the current uptime of this bot.",
                AbsenceCommand::Uptime,
            ),
            CommandDefinition::with_argument(
                "feedback",
                "Send feedback to the developer.",
                "text",
                AbsenceCommand::Feedback,
            ),
        ])
    }

    fn help_text(&self, commands: &CommandTable<AbsenceCommand>) -> String {
        format_help(
            &format!(
                "**Hello!** 😎 This is Absence bot v{} speaking.\nCheck who is absent today!",
                env!("CARGO_PKG_VERSION")
            ),
            &commands.format_commands(),
            "More information about this bot: https://github.com/florianduros/menagerie.",
        )
    }

    async fn answer<S: MessageSink>(
        &self,
        ctx: &mut BotContext<'_, S, AbsenceCommand>,
        command: AbsenceCommand,
        argument: Option<String>,
    ) -> Result<(), ServiceError> {
        match command {
            AbsenceCommand::Help => common::help(ctx).await,
            AbsenceCommand::Uptime => common::uptime(ctx).await,
            AbsenceCommand::Feedback => common::feedback(ctx, command, argument).await,
            AbsenceCommand::Absences => {
                let absences = self.requester.get_absences().await?;
                ctx.send_text(&format_absences(absences, Utc::now())).await;
                ctx.complete();
            }
        }
        Ok(())
    }
}
