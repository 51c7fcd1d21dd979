//! Telegram update handlers.
//!
//! Only slash commands are acted on; every other message is ignored. Translation from
//! teloxide types to the core `Command` happens here so the command logic stays testable
//! without Telegram.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use lnb_core::{
    domain::{ChatId, UserId},
    messaging::types::{ChatKind, Command},
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(cmd) = command_from_message(&msg) else {
        return Ok(());
    };

    tracing::debug!(
        chat_id = cmd.chat_id.0,
        user_id = cmd.user_id.0,
        command = %cmd.name,
        "command received"
    );
    state.commands.handle(&cmd).await;
    Ok(())
}

/// Extract a command from a text message with a known sender.
pub fn command_from_message(msg: &Message) -> Option<Command> {
    let text = msg.text()?;
    // Channel posts and anonymous admins carry no usable sender.
    let user = msg.from()?;

    Command::from_text(
        ChatId(msg.chat.id.0),
        chat_kind(&msg.chat),
        msg.chat.title().map(str::to_string),
        UserId(user.id.0 as i64),
        text,
    )
}

fn chat_kind(chat: &teloxide::types::Chat) -> ChatKind {
    if chat.is_supergroup() {
        ChatKind::Supergroup
    } else if chat.is_group() {
        ChatKind::Group
    } else if chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Private
    }
}
