//! Telegram update handlers.
//!
//! Each handler records the incoming message in the chat window, then routes:
//! location events to the location handler, `/commands` to the command
//! handler, everything else through intent resolution and the conversation
//! state machine.

use std::sync::Arc;

use teloxide::prelude::*;

use kursbot_core::domain::{ChatId, MessageId};

use crate::router::AppState;

mod commands;
mod location;
mod text;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;

    // One message at a time per chat: state transitions for a user are
    // applied in arrival order.
    let _guard = state.chat_locks.lock_chat(chat_id).await;

    state
        .window
        .record(
            state.messenger.as_ref(),
            ChatId(chat_id),
            MessageId(msg.id.0),
        )
        .await;

    if msg.location().is_some() {
        return location::handle_location(msg, state).await;
    }

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(msg, state).await;
        }
        return text::handle_text(msg, state).await;
    }

    Ok(())
}
