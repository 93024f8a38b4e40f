//! Static command tables.
//!
//! Every bot declares the commands it understands as a list of
//! [`CommandDefinition`]s. The [`CommandTable`] answers two questions about that
//! list: which command a token names, and how the list reads in the help text.

/// A single command a bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDefinition<C> {
    /// Lowercase token typed after the `/` marker
    pub name: &'static str,
    /// Human readable description shown in the help text
    pub description: &'static str,
    /// Whether the text following the token is captured as an argument
    pub takes_argument: bool,
    /// Optional label rendered as `<label>` in the help text
    pub argument_label: Option<&'static str>,
    /// Bot specific identifier dispatched to the handlers
    pub command: C,
}

impl<C> CommandDefinition<C> {
    /// Defines a command that ignores any trailing text.
    pub const fn new(name: &'static str, description: &'static str, command: C) -> Self {
        CommandDefinition {
            name,
            description,
            takes_argument: false,
            argument_label: None,
            command,
        }
    }

    /// Defines a command that captures the trailing text as its argument.
    pub const fn with_argument(
        name: &'static str,
        description: &'static str,
        argument_label: &'static str,
        command: C,
    ) -> Self {
        CommandDefinition {
            name,
            description,
            takes_argument: true,
            argument_label: Some(argument_label),
            command,
        }
    }
}

/// Ordered collection of the commands of one bot.
///
/// Names are unique within a table. Lookup ignores the case of the token.
///
/// # Examples
///
/// ```
/// # use menagerie::commands::table::{CommandDefinition, CommandTable};
/// let table = CommandTable::new(vec![
///     CommandDefinition::new("help", "Display this message.", 0),
///     CommandDefinition::with_argument("feedback", "Send feedback to the developer.", "text", 1),
/// ]);
///
/// assert_eq!(table.lookup("HELP").map(|d| d.command), Some(0));
/// ```
#[derive(Debug, Clone)]
pub struct CommandTable<C> {
    definitions: Vec<CommandDefinition<C>>,
}

impl<C> CommandTable<C> {
    pub fn new(definitions: Vec<CommandDefinition<C>>) -> Self {
        debug_assert!(
            definitions
                .iter()
                .enumerate()
                .all(|(i, a)| definitions[i + 1..].iter().all(|b| a.name != b.name)),
            "command names must be unique"
        );
        CommandTable { definitions }
    }

    /// Finds the definition named by `token`, ignoring case.
    pub fn lookup(&self, token: &str) -> Option<&CommandDefinition<C>> {
        self.definitions
            .iter()
            .find(|definition| definition.name.eq_ignore_ascii_case(token))
    }

    /// Iterates over the definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition<C>> {
        self.definitions.iter()
    }

    /// Formats the command list for the help text.
    ///
    /// Commands are sorted by name and rendered one per line as
    /// `- **/name <label>**: description`. The label only appears for commands
    /// that take an argument.
    ///
    /// # Returns
    ///
    /// A Markdown string starting with a newline, ready to be appended to a
    /// help header.
    pub fn format_commands(&self) -> String {
        let mut sorted: Vec<&CommandDefinition<C>> = self.definitions.iter().collect();
        sorted.sort_by_key(|definition| definition.name);

        sorted.iter().fold(String::new(), |mut help, definition| {
            let label = match (definition.takes_argument, definition.argument_label) {
                (true, Some(label)) => format!(" <{label}>"),
                _ => String::new(),
            };
            help.push_str(&format!(
                "\n- **/{}{}**: {}",
                definition.name, label, definition.description
            ));
            help
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestCommand {
        Help,
        Comic,
        Uptime,
    }

    fn table() -> CommandTable<TestCommand> {
        CommandTable::new(vec![
            CommandDefinition::new("help", "Display this message.", TestCommand::Help),
            CommandDefinition::with_argument("comic", "Get a comic.", "number", TestCommand::Comic),
            CommandDefinition::new(
                "uptime",
                "Get the current uptime of this bot.",
                TestCommand::Uptime,
            ),
        ])
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = table();
        assert_eq!(table.lookup("help").unwrap().command, TestCommand::Help);
        assert_eq!(table.lookup("HeLp").unwrap().command, TestCommand::Help);
        assert_eq!(table.lookup("COMIC").unwrap().command, TestCommand::Comic);
    }

    #[test]
    fn test_lookup_unknown_token() {
        assert!(table().lookup("bogus").is_none());
        assert!(table().lookup("").is_none());
    }

    #[test]
    fn test_format_commands_sorted_with_labels() {
        let help = table().format_commands();
        assert_eq!(
            help,
            "\n- **/comic <number>**: Get a comic.\
             \n- **/help**: Display this message.\
             \n- **/uptime**: Get the current uptime of this bot."
        );
    }

    #[test]
    fn test_label_hidden_without_argument() {
        let table = CommandTable::new(vec![CommandDefinition {
            name: "out",
            description: "Who is out today.",
            takes_argument: false,
            argument_label: Some("ignored"),
            command: (),
        }]);
        assert_eq!(table.format_commands(), "\n- **/out**: Who is out today.");
    }
}
