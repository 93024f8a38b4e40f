//! Markdown response formatters shared by all bots.
//!
//! Bot specific answers live next to their bot; this module holds the
//! messages every bot uses the same way.

use std::time::Duration;

/// Generic answer when an external service failed.
pub const TRY_AGAIN_LATER: &str = "Sorry, an error occured. Please try again later.";

/// Question asked by `/feedback` without text.
pub const FEEDBACK_QUESTION: &str = "What would you like to tell the developer?";

/// Confirmation sent once feedback was forwarded.
pub const FEEDBACK_THANKS: &str = "Thank you for your feedback.";

/// Answer to `/feedback` when no feedback conversation is configured.
pub const FEEDBACK_UNAVAILABLE: &str = "Sorry, the developer did not specify a feedback channel.";

/// Formats the help text of a bot.
///
/// # Arguments
///
/// * `intro` - Greeting and purpose of the bot
/// * `commands` - Output of [`CommandTable::format_commands`](crate::commands::table::CommandTable::format_commands)
/// * `outro` - Links and credits
///
/// # Examples
///
/// ```
/// # use menagerie::commands::markdown_response::format_help;
/// let help = format_help("**Hello!**", "\n- **/help**: Display this message.", "Bye");
/// assert_eq!(help, "**Hello!**\n\nAvailable commands:\n\n- **/help**: Display this message.\n\nBye");
/// ```
pub fn format_help(intro: &str, commands: &str, outro: &str) -> String {
    format!("{intro}\n\nAvailable commands:\n{commands}\n\n{outro}")
}

/// Formats the answer to an unknown `/token`.
pub fn format_unknown_command(raw_token: &str) -> String {
    format!("Sorry, I don't know the command \"{raw_token}\" yet.")
}

/// Formats the answer to a command without implementation.
pub fn format_not_implemented(raw_token: &str) -> String {
    format!("Sorry, \"{raw_token}\" is not implemented yet.")
}

/// Formats feedback forwarded to the developer.
pub fn format_feedback(sender_id: &str, text: &str) -> String {
    format!("Feedback from user \"{sender_id}\":\n\"{text}\"")
}

/// Formats the answer to `/uptime`.
///
/// Uptime is rendered as `HH:MM:SS`, hours keep counting past a day.
///
/// # Examples
///
/// ```
/// # use menagerie::commands::markdown_response::format_uptime;
/// # use std::time::Duration;
/// assert_eq!(format_uptime(Duration::from_secs(3725)), "Current uptime: 01:02:05");
/// ```
pub fn format_uptime(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    format!(
        "Current uptime: {:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
