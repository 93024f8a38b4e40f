//! Slash-command tokenizer.
//!
//! [`CommandParser::parse`] turns the raw text of a message into a
//! [`ParseResult`]. A message is a command when it starts with `/` followed by
//! a word; the rest of the line after a single space is the argument.
//!
//! Parsing never fails: every string maps to exactly one variant.

use log::{debug, info};
use regex::Regex;

use crate::commands::table::CommandTable;

/// Outcome of parsing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult<C> {
    /// The token matched a command of the table.
    ///
    /// `argument` is only set for commands taking an argument, when non blank
    /// text followed the token. It is trimmed, its case is kept.
    Recognized { command: C, argument: Option<String> },
    /// The text looked like a command but the token is unknown.
    ///
    /// `raw_token` is lowercased, `text` is the untouched message.
    Unrecognized { raw_token: String, text: String },
    /// The text is not a command.
    PlainText { text: String },
}

/// Parser bound to the command table of one bot.
pub struct CommandParser<C> {
    table: CommandTable<C>,
    pattern: Regex,
}

impl<C: Copy> CommandParser<C> {
    pub fn new(table: CommandTable<C>) -> Self {
        let pattern = Regex::new(r"^/(\w+)(?: (.*))?").expect("command pattern is a valid regex");
        CommandParser { table, pattern }
    }

    /// Returns the table the parser resolves tokens against.
    pub fn table(&self) -> &CommandTable<C> {
        &self.table
    }

    /// Parses the text of a message.
    ///
    /// # Arguments
    ///
    /// * `text` - The raw message body
    ///
    /// # Returns
    ///
    /// - [`ParseResult::PlainText`] when the text does not start with `/word`
    /// - [`ParseResult::Recognized`] when the word names a known command
    /// - [`ParseResult::Unrecognized`] otherwise
    pub fn parse(&self, text: &str) -> ParseResult<C> {
        let Some(captures) = self.pattern.captures(text) else {
            debug!("no command found for \"{}\"", truncate(text, 10));
            return ParseResult::PlainText {
                text: text.to_owned(),
            };
        };

        let token = captures
            .get(1)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default();

        match self.table.lookup(&token) {
            Some(definition) => {
                info!("found command \"{}\"", definition.name);

                let argument = if definition.takes_argument {
                    captures
                        .get(2)
                        .and_then(|m| normalize_argument(m.as_str()))
                } else {
                    None
                };

                ParseResult::Recognized {
                    command: definition.command,
                    argument,
                }
            }
            None => {
                info!("unknown command \"{token}\"");
                ParseResult::Unrecognized {
                    raw_token: token,
                    text: text.to_owned(),
                }
            }
        }
    }
}

/// Trims an argument, a blank argument is missing.
///
/// Applied both to inline arguments and to answers of pending questions.
pub fn normalize_argument(text: &str) -> Option<String> {
    Some(text.trim())
        .filter(|argument| !argument.is_empty())
        .map(str::to_owned)
}

/// Shortens `text` to `max` characters for log lines.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_owned()
    }
}
