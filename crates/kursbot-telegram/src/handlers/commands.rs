use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use kursbot_core::domain::{ChatId, UserId};

use crate::router::AppState;

use super::text::{reply_menu, DEFAULT_PROMPT};

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat = ChatId(msg.chat.id.0);
    let user = UserId(user.id.0 as i64);
    let (cmd, _args) = parse_command(text);

    let result = match cmd.as_str() {
        "start" => {
            // /start is a fresh beginning; whatever flow was pending is gone.
            state.states.end(user).await;
            let greeting = format!(
                "Hello! I convert USD/EUR ↔ {} and can send you daily rate \
                 and weather digests.\n{DEFAULT_PROMPT}",
                state.cfg.local_currency
            );
            reply_menu(&state, chat, &greeting).await
        }
        "help" => reply_menu(&state, chat, &state.menu.help_html()).await,
        _ => reply_menu(&state, chat, DEFAULT_PROMPT).await,
    };

    if let Err(e) = result {
        warn!("command /{cmd} failed for chat {}: {e}", chat.0);
    }
    Ok(())
}
