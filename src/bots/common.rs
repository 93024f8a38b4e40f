//! Handlers shared by most bots: `/help`, `/uptime` and `/feedback`.

use log::info;

use crate::{
    bots::BotContext,
    commands::markdown_response::{
        FEEDBACK_QUESTION, FEEDBACK_THANKS, FEEDBACK_UNAVAILABLE, format_feedback, format_uptime,
    },
    sink::MessageSink,
};

pub async fn help<S: MessageSink, C: Clone>(ctx: &mut BotContext<'_, S, C>) {
    let help_text = ctx.help_text;
    ctx.reply(help_text).await;
    ctx.complete();
}

pub async fn uptime<S: MessageSink, C: Clone>(ctx: &mut BotContext<'_, S, C>) {
    let uptime = ctx.settings.started_at.elapsed();
    ctx.reply(&format_uptime(uptime)).await;
    ctx.complete();
}

/// Forwards feedback to the feedback conversation.
///
/// Without text the user is asked for it, the next message then comes back
/// here as `argument`.
pub async fn feedback<S: MessageSink, C: Clone>(
    ctx: &mut BotContext<'_, S, C>,
    command: C,
    argument: Option<String>,
) {
    let settings = ctx.settings;
    let Some(feedback_conversation) = settings.feedback_conversation.as_deref() else {
        ctx.reply(FEEDBACK_UNAVAILABLE).await;
        return;
    };

    let Some(text) = argument else {
        ctx.ask(command, FEEDBACK_QUESTION).await;
        return;
    };

    info!(
        "sending feedback from {} to {}",
        ctx.sender_id, feedback_conversation
    );
    ctx.sink
        .send_text(feedback_conversation, &format_feedback(ctx.sender_id, &text))
        .await;
    ctx.complete();
    ctx.reply(FEEDBACK_THANKS).await;
}
