//! Command dispatch with pending state.
//!
//! The [`Dispatcher`] owns the bot, its parser and the pending cache of every
//! conversation. For each text message it decides which command actually
//! runs:
//!
//! 1. An explicit command always wins and discards any pending question.
//! 2. Otherwise, if the conversation awaits an argument, the whole message
//!    becomes the argument of the pending command.
//! 3. Otherwise plain text goes to the bot's plain text hook and an unknown
//!    `/token` gets the unknown command answer.
//!
//! Handler failures stop at this boundary: they are logged and the user gets
//! a generic apology.

use std::time::Duration;

use log::{debug, error, info};

use crate::{
    bots::{Bot, BotContext, BotSettings},
    commands::{
        markdown_response::TRY_AGAIN_LATER,
        parser::{CommandParser, ParseResult, normalize_argument},
        pending::{PendingCache, PendingEntry},
    },
    sink::{MessageSink, Reaction},
};

/// What the dispatcher decided for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<C> {
    /// Run `command` with `argument`
    Execute { command: C, argument: Option<String> },
    /// Answer an unknown `/token`
    Unknown { raw_token: String, text: String },
    /// Hand plain text to the bot with the continuation of the conversation
    PlainText {
        text: String,
        pending: Option<PendingEntry<C>>,
    },
}

/// Routes text messages of all conversations to one bot.
pub struct Dispatcher<B: Bot> {
    bot: B,
    parser: CommandParser<B::Command>,
    pending: PendingCache<B::Command>,
    settings: BotSettings,
    help_text: String,
}

impl<B: Bot> Dispatcher<B> {
    /// Creates a dispatcher for `bot`.
    ///
    /// # Arguments
    ///
    /// * `bot` - The bot executing the commands
    /// * `settings` - Settings shared by the handlers
    /// * `pending_ttl` - Lifetime of pending questions, `None` keeps them forever
    pub fn new(bot: B, settings: BotSettings, pending_ttl: Option<Duration>) -> Self {
        let commands = bot.commands();
        let help_text = bot.help_text(&commands);

        Dispatcher {
            parser: CommandParser::new(commands),
            pending: PendingCache::new(pending_ttl),
            bot,
            settings,
            help_text,
        }
    }

    pub fn bot(&self) -> &B {
        &self.bot
    }

    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    /// Decides the effective command of a message.
    ///
    /// Updates the pending cache of the conversation as a side effect: an
    /// explicit command or a consumed answer clears it.
    pub fn resolve(
        &mut self,
        conversation_id: &str,
        parse_result: ParseResult<B::Command>,
    ) -> Dispatch<B::Command> {
        match parse_result {
            ParseResult::Recognized { command, argument } => {
                self.pending.clear(conversation_id);
                Dispatch::Execute { command, argument }
            }
            ParseResult::Unrecognized { raw_token, text } => {
                match self.take_awaiting(conversation_id) {
                    Some(command) => Dispatch::Execute {
                        command,
                        argument: normalize_argument(&text),
                    },
                    None => Dispatch::Unknown { raw_token, text },
                }
            }
            ParseResult::PlainText { text } => match self.take_awaiting(conversation_id) {
                Some(command) => Dispatch::Execute {
                    command,
                    argument: normalize_argument(&text),
                },
                None => Dispatch::PlainText {
                    pending: self.pending.get(conversation_id),
                    text,
                },
            },
        }
    }

    /// Handles one text message.
    ///
    /// # Arguments
    ///
    /// * `sink` - Where the answers go
    /// * `conversation_id` - Conversation the message was posted in
    /// * `sender_id` - Author of the message
    /// * `message_id` - Identifier of the message, for replies and reactions
    /// * `text` - Body of the message
    pub async fn handle_text<S: MessageSink>(
        &mut self,
        sink: &S,
        conversation_id: &str,
        sender_id: &str,
        message_id: &str,
        text: &str,
    ) {
        self.pending.purge_expired();

        let parse_result = self.parser.parse(text);
        let dispatch = self.resolve(conversation_id, parse_result);
        debug!("{} dispatch in {conversation_id}: {dispatch:?}", self.bot.name());

        let mut ctx = BotContext {
            sink,
            pending: &mut self.pending,
            settings: &self.settings,
            help_text: &self.help_text,
            conversation_id,
            sender_id,
            message_id,
        };

        let result = match dispatch {
            Dispatch::Execute { command, argument } => {
                info!("{} runs {command:?} for {sender_id}", self.bot.name());
                sink.send_reaction(conversation_id, message_id, Reaction::Like)
                    .await;
                self.bot.answer(&mut ctx, command, argument).await
            }
            Dispatch::Unknown { raw_token, text } => {
                self.bot
                    .on_unknown_command(&mut ctx, &raw_token, &text)
                    .await
            }
            Dispatch::PlainText { text, pending } => {
                self.bot.on_plain_text(&mut ctx, &text, pending).await
            }
        };

        if let Err(e) = result {
            error!(
                "{} failed to answer in {conversation_id}: {e}",
                self.bot.name()
            );
            ctx.reply(TRY_AGAIN_LATER).await;
        }
    }

    /// Removes and returns the command awaiting an argument, if any.
    fn take_awaiting(&mut self, conversation_id: &str) -> Option<B::Command> {
        let entry = self
            .pending
            .get(conversation_id)
            .filter(|entry| entry.awaiting_argument)?;
        self.pending.clear(conversation_id);
        Some(entry.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bots::common,
        commands::table::{CommandDefinition, CommandTable},
        services::ServiceError,
        sink::MockMessageSink,
    };
    use mockall::{Sequence, predicate::eq};

    const ROOM: &str = "!room:example.com";
    const FEEDBACK_ROOM: &str = "!feedback:example.com";
    const ALICE: &str = "@alice:example.com";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestCommand {
        Help,
        Feedback,
        Comic,
        Broken,
    }

    struct TestBot;

    impl Bot for TestBot {
        type Command = TestCommand;

        fn name(&self) -> &'static str {
            "test"
        }

        fn commands(&self) -> CommandTable<TestCommand> {
            CommandTable::new(vec![
                CommandDefinition::new("help", "Display this message.", TestCommand::Help),
                CommandDefinition::with_argument(
                    "feedback",
                    "Send feedback to the developer.",
                    "text",
                    TestCommand::Feedback,
                ),
                CommandDefinition::with_argument(
                    "comic",
                    "Get a comic.",
                    "number",
                    TestCommand::Comic,
                ),
                CommandDefinition::new("broken", "Always fails.", TestCommand::Broken),
            ])
        }

        fn help_text(&self, commands: &CommandTable<TestCommand>) -> String {
            format!("Test bot{}", commands.format_commands())
        }

        async fn answer<S: MessageSink>(
            &self,
            ctx: &mut BotContext<'_, S, TestCommand>,
            command: TestCommand,
            argument: Option<String>,
        ) -> Result<(), ServiceError> {
            match command {
                TestCommand::Help => common::help(ctx).await,
                TestCommand::Feedback => common::feedback(ctx, command, argument).await,
                TestCommand::Comic => match argument {
                    None => ctx.ask(command, "Which comic?").await,
                    Some(number) => {
                        ctx.reply(&format!("comic {number}")).await;
                        ctx.complete();
                    }
                },
                TestCommand::Broken => return Err(ServiceError::Api("boom".to_owned())),
            }
            Ok(())
        }
    }

    fn dispatcher(feedback: Option<&str>) -> Dispatcher<TestBot> {
        Dispatcher::new(
            TestBot,
            BotSettings::new(feedback.map(str::to_owned)),
            Some(Duration::from_secs(600)),
        )
    }

    fn expect_like(sink: &mut MockMessageSink, message_id: &'static str) {
        sink.expect_send_reaction()
            .with(eq(ROOM), eq(message_id), eq(Reaction::Like))
            .times(1)
            .returning(|_, _, _| ());
    }

    fn expect_reply(sink: &mut MockMessageSink, message_id: &'static str, text: &'static str) {
        sink.expect_send_reply()
            .withf(move |room, sender, message, body| {
                room == ROOM && sender == ALICE && message == message_id && body == text
            })
            .times(1)
            .returning(|_, _, _, _| ());
    }

    #[test]
    fn test_resolve_recognized_preempts_pending() {
        let mut dispatcher = dispatcher(None);
        dispatcher
            .pending
            .set(ROOM, PendingEntry::awaiting(TestCommand::Comic));

        let dispatch = dispatcher.resolve(
            ROOM,
            ParseResult::Recognized {
                command: TestCommand::Help,
                argument: None,
            },
        );

        assert_eq!(
            dispatch,
            Dispatch::Execute {
                command: TestCommand::Help,
                argument: None
            }
        );
        assert!(dispatcher.pending.get(ROOM).is_none());
    }

    #[test]
    fn test_resolve_plain_text_fills_pending_argument() {
        let mut dispatcher = dispatcher(None);
        dispatcher
            .pending
            .set(ROOM, PendingEntry::awaiting(TestCommand::Comic));

        let dispatch = dispatcher.resolve(
            ROOM,
            ParseResult::PlainText {
                text: "42".to_owned(),
            },
        );

        assert_eq!(
            dispatch,
            Dispatch::Execute {
                command: TestCommand::Comic,
                argument: Some("42".to_owned())
            }
        );
        assert!(dispatcher.pending.get(ROOM).is_none());
    }

    #[test]
    fn test_resolve_unrecognized_fills_pending_argument_with_full_text() {
        let mut dispatcher = dispatcher(None);
        dispatcher
            .pending
            .set(ROOM, PendingEntry::awaiting(TestCommand::Feedback));

        let dispatch = dispatcher.resolve(
            ROOM,
            ParseResult::Unrecognized {
                raw_token: "love".to_owned(),
                text: "/love this bot".to_owned(),
            },
        );

        assert_eq!(
            dispatch,
            Dispatch::Execute {
                command: TestCommand::Feedback,
                argument: Some("/love this bot".to_owned())
            }
        );
    }

    #[test]
    fn test_resolve_plain_text_keeps_continuation() {
        let mut dispatcher = dispatcher(None);
        let continuation = PendingEntry::continuation(TestCommand::Comic, "xkcd".to_owned(), 2);
        dispatcher.pending.set(ROOM, continuation.clone());

        let dispatch = dispatcher.resolve(
            ROOM,
            ParseResult::PlainText {
                text: "yes".to_owned(),
            },
        );

        assert_eq!(
            dispatch,
            Dispatch::PlainText {
                text: "yes".to_owned(),
                pending: Some(continuation)
            }
        );
        assert!(dispatcher.pending.get(ROOM).is_some());
    }

    #[test]
    fn test_resolve_answer_is_normalized_like_inline_argument() {
        let mut dispatcher = dispatcher(None);
        let parsed = dispatcher.parser.parse("/comic  42 ");
        let inline = dispatcher.resolve(ROOM, parsed);

        dispatcher
            .pending
            .set(ROOM, PendingEntry::awaiting(TestCommand::Comic));
        let answer = dispatcher.resolve(
            ROOM,
            ParseResult::PlainText {
                text: " 42 ".to_owned(),
            },
        );

        assert_eq!(inline, answer);
        assert_eq!(
            answer,
            Dispatch::Execute {
                command: TestCommand::Comic,
                argument: Some("42".to_owned())
            }
        );
    }

    #[test]
    fn test_resolve_blank_answer_is_missing_argument() {
        let mut dispatcher = dispatcher(None);
        dispatcher
            .pending
            .set(ROOM, PendingEntry::awaiting(TestCommand::Comic));

        let dispatch = dispatcher.resolve(
            ROOM,
            ParseResult::PlainText {
                text: "   ".to_owned(),
            },
        );

        assert_eq!(
            dispatch,
            Dispatch::Execute {
                command: TestCommand::Comic,
                argument: None
            }
        );
    }

    #[test]
    fn test_resolve_unrecognized_without_pending() {
        let mut dispatcher = dispatcher(None);
        let dispatch = dispatcher.resolve(
            ROOM,
            ParseResult::Unrecognized {
                raw_token: "bogus".to_owned(),
                text: "/bogus".to_owned(),
            },
        );
        assert_eq!(
            dispatch,
            Dispatch::Unknown {
                raw_token: "bogus".to_owned(),
                text: "/bogus".to_owned()
            }
        );
    }

    #[test]
    fn test_resolve_ignores_expired_pending() {
        let mut dispatcher = Dispatcher::new(TestBot, BotSettings::new(None), Some(Duration::ZERO));
        dispatcher
            .pending
            .set(ROOM, PendingEntry::awaiting(TestCommand::Comic));

        let dispatch = dispatcher.resolve(
            ROOM,
            ParseResult::PlainText {
                text: "42".to_owned(),
            },
        );

        assert_eq!(
            dispatch,
            Dispatch::PlainText {
                text: "42".to_owned(),
                pending: None
            }
        );
    }

    #[tokio::test]
    async fn test_feedback_dialogue() {
        let mut dispatcher = dispatcher(Some(FEEDBACK_ROOM));
        let mut sink = MockMessageSink::new();
        let mut seq = Sequence::new();

        sink.expect_send_reaction()
            .with(eq(ROOM), eq("$1"), eq(Reaction::Like))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| ());
        sink.expect_send_reply()
            .withf(|room, _, message, body| {
                room == ROOM
                    && message == "$1"
                    && body == "What would you like to tell the developer?"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| ());

        dispatcher
            .handle_text(&sink, ROOM, ALICE, "$1", "/feedback")
            .await;

        let entry = dispatcher.pending.get(ROOM).unwrap();
        assert_eq!(entry.command, TestCommand::Feedback);
        assert!(entry.awaiting_argument);
        sink.checkpoint();
        let mut seq = Sequence::new();

        sink.expect_send_reaction()
            .with(eq(ROOM), eq("$2"), eq(Reaction::Like))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| ());
        sink.expect_send_text()
            .with(
                eq(FEEDBACK_ROOM),
                eq("Feedback from user \"@alice:example.com\":\n\"Great bot!\""),
            )
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| ());
        sink.expect_send_reply()
            .withf(|room, _, message, body| {
                room == ROOM && message == "$2" && body == "Thank you for your feedback."
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| ());

        dispatcher
            .handle_text(&sink, ROOM, ALICE, "$2", "Great bot!")
            .await;

        assert!(dispatcher.pending.get(ROOM).is_none());
    }

    #[tokio::test]
    async fn test_feedback_without_channel() {
        let mut dispatcher = dispatcher(None);
        let mut sink = MockMessageSink::new();
        expect_like(&mut sink, "$1");
        expect_reply(
            &mut sink,
            "$1",
            "Sorry, the developer did not specify a feedback channel.",
        );

        dispatcher
            .handle_text(&sink, ROOM, ALICE, "$1", "/feedback nice")
            .await;

        assert!(dispatcher.pending.get(ROOM).is_none());
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let mut dispatcher = dispatcher(None);
        let mut sink = MockMessageSink::new();
        sink.expect_send_reaction().never();
        expect_reply(
            &mut sink,
            "$1",
            "Sorry, I don't know the command \"bogus\" yet.",
        );

        dispatcher
            .handle_text(&sink, ROOM, ALICE, "$1", "/bogus")
            .await;

        assert!(dispatcher.pending.get(ROOM).is_none());
    }

    #[tokio::test]
    async fn test_plain_text_without_pending_is_ignored() {
        let mut dispatcher = dispatcher(None);
        let sink = MockMessageSink::new();

        // Any call on the mock would panic
        dispatcher
            .handle_text(&sink, ROOM, ALICE, "$1", "hello")
            .await;

        assert!(dispatcher.pending.get(ROOM).is_none());
    }

    #[tokio::test]
    async fn test_new_command_preempts_question() {
        let mut dispatcher = dispatcher(None);
        let mut sink = MockMessageSink::new();
        expect_like(&mut sink, "$1");
        expect_reply(&mut sink, "$1", "Which comic?");

        dispatcher
            .handle_text(&sink, ROOM, ALICE, "$1", "/comic")
            .await;
        assert!(dispatcher.pending.get(ROOM).is_some());
        sink.checkpoint();

        expect_like(&mut sink, "$2");
        sink.expect_send_reply()
            .withf(|_, _, message, body| message == "$2" && body.starts_with("Test bot"))
            .times(1)
            .returning(|_, _, _, _| ());

        dispatcher
            .handle_text(&sink, ROOM, ALICE, "$2", "/HELP")
            .await;
        assert!(dispatcher.pending.get(ROOM).is_none());
    }

    #[tokio::test]
    async fn test_handler_failure_is_reported() {
        let mut dispatcher = dispatcher(None);
        let mut sink = MockMessageSink::new();
        expect_like(&mut sink, "$1");
        expect_reply(
            &mut sink,
            "$1",
            "Sorry, an error occured. Please try again later.",
        );

        dispatcher
            .handle_text(&sink, ROOM, ALICE, "$1", "/broken")
            .await;
    }

    #[tokio::test]
    async fn test_conversations_do_not_share_questions() {
        let mut dispatcher = dispatcher(None);
        let mut sink = MockMessageSink::new();
        expect_like(&mut sink, "$1");
        expect_reply(&mut sink, "$1", "Which comic?");

        dispatcher
            .handle_text(&sink, ROOM, ALICE, "$1", "/comic")
            .await;
        sink.checkpoint();

        // Plain text in another room is not an answer
        dispatcher
            .handle_text(&sink, "!other:example.com", ALICE, "$2", "42")
            .await;
        assert!(dispatcher.pending.get(ROOM).is_some());
    }

    #[tokio::test]
    async fn test_blank_answer_asks_again() {
        let mut dispatcher = dispatcher(None);
        let mut sink = MockMessageSink::new();
        expect_like(&mut sink, "$1");
        expect_reply(&mut sink, "$1", "Which comic?");
        expect_like(&mut sink, "$2");
        expect_reply(&mut sink, "$2", "Which comic?");

        dispatcher
            .handle_text(&sink, ROOM, ALICE, "$1", "/comic")
            .await;
        dispatcher.handle_text(&sink, ROOM, ALICE, "$2", "   ").await;

        let entry = dispatcher.pending.get(ROOM).unwrap();
        assert_eq!(entry.command, TestCommand::Comic);
        assert!(entry.awaiting_argument);
    }

    #[tokio::test]
    async fn test_completing_twice_leaves_no_pending_entry() {
        let mut dispatcher = dispatcher(None);
        let mut sink = MockMessageSink::new();
        expect_like(&mut sink, "$1");
        expect_reply(&mut sink, "$1", "Which comic?");
        expect_like(&mut sink, "$2");
        expect_reply(&mut sink, "$2", "comic 42");
        expect_like(&mut sink, "$3");
        expect_reply(&mut sink, "$3", "comic 42");

        dispatcher
            .handle_text(&sink, ROOM, ALICE, "$1", "/comic")
            .await;
        assert!(dispatcher.pending.get(ROOM).is_some());

        dispatcher
            .handle_text(&sink, ROOM, ALICE, "$2", "/comic 42")
            .await;
        assert!(dispatcher.pending.get(ROOM).is_none());

        dispatcher
            .handle_text(&sink, ROOM, ALICE, "$3", "/comic 42")
            .await;
        assert!(dispatcher.pending.get(ROOM).is_none());
    }
}
