use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use kursbot_core::{
    conversation::{Advance, DialogState},
    domain::{ChatId, LocationPurpose, MenuIntent, UserId},
    formatting, Result,
};

use crate::router::AppState;

pub(crate) const DEFAULT_PROMPT: &str = "Pick a button below 👇";
pub(crate) const WEATHER_NOT_CONFIGURED: &str =
    "Weather is not configured on this bot (missing API key).";

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat = ChatId(msg.chat.id.0);
    let user = UserId(user.id.0 as i64);

    if let Err(e) = dispatch_text(&state, chat, user, text).await {
        warn!("text handler failed for chat {}: {e}", chat.0);
    }
    Ok(())
}

/// Menu-label inputs always win over state-driven parsing, so a user can
/// escape a stuck flow via a button.
pub(crate) async fn dispatch_text(
    state: &AppState,
    chat: ChatId,
    user: UserId,
    text: &str,
) -> Result<()> {
    if let Some(intent) = state.menu.resolve(text) {
        state.states.end(user).await;
        return handle_intent(state, chat, user, intent).await;
    }

    match state
        .states
        .advance(user, text, &state.rates, &state.cfg.local_currency)
        .await
    {
        Advance::Idle => reply_menu(state, chat, DEFAULT_PROMPT).await,
        Advance::Done(line) => reply(state, chat, &line).await,
        Advance::Retry(prompt) => reply(state, chat, &prompt).await,
    }
}

pub(crate) async fn handle_intent(
    state: &AppState,
    chat: ChatId,
    user: UserId,
    intent: MenuIntent,
) -> Result<()> {
    match intent {
        MenuIntent::ShowRates => {
            let mut snapshot = state.rates.snapshot().await;
            if snapshot.is_empty() {
                if let Some(code) = state.cfg.tracked_currencies.first() {
                    let _ = state.rates.ensure_fresh(code).await;
                }
                snapshot = state.rates.snapshot().await;
            }
            if snapshot.is_empty() {
                reply(
                    state,
                    chat,
                    "Sorry, rates are not available yet. Try again in a minute.",
                )
                .await
            } else {
                reply(
                    state,
                    chat,
                    &formatting::rate_lines(&snapshot, &state.cfg.local_currency),
                )
                .await
            }
        }

        MenuIntent::Convert(direction) => {
            state
                .states
                .begin(user, DialogState::AwaitingAmount(direction))
                .await;
            let (from, to) = if direction.to_local() {
                (direction.foreign_code(), state.cfg.local_currency.as_str())
            } else {
                (state.cfg.local_currency.as_str(), direction.foreign_code())
            };
            reply(
                state,
                chat,
                &format!("How much {from} should I convert to {to}? Send a number."),
            )
            .await
        }

        MenuIntent::ToggleCurrencyDigest => {
            let subscribed = state.registry.toggle_currency(chat).await?;
            let text = if subscribed {
                "✅ Daily exchange-rate digest enabled."
            } else {
                "⛔ Daily exchange-rate digest disabled."
            };
            reply(state, chat, text).await
        }

        MenuIntent::ForecastNow => {
            if state.weather.is_none() {
                return reply(state, chat, WEATHER_NOT_CONFIGURED).await;
            }
            state
                .states
                .begin(
                    user,
                    DialogState::AwaitingLocation(LocationPurpose::OneShotForecast),
                )
                .await;
            reply(
                state,
                chat,
                "Share a location with the 📍 button and I'll send the forecast.",
            )
            .await
        }

        MenuIntent::ToggleWeatherDigest => {
            if state.weather.is_none() {
                return reply(state, chat, WEATHER_NOT_CONFIGURED).await;
            }
            if state.registry.is_weather_subscriber(chat).await {
                state.registry.unsubscribe_weather(chat).await?;
                reply(state, chat, "⛔ Daily weather digest disabled.").await
            } else {
                state
                    .states
                    .begin(
                        user,
                        DialogState::AwaitingLocation(LocationPurpose::WeatherSubscription),
                    )
                    .await;
                reply(
                    state,
                    chat,
                    "Share a location with the 📍 button to enable the daily weather digest.",
                )
                .await
            }
        }

        MenuIntent::Help => reply_menu(state, chat, &state.menu.help_html()).await,
    }
}

pub(crate) async fn reply(state: &AppState, chat: ChatId, html: &str) -> Result<()> {
    let sent = state.messenger.send_html(chat, html).await?;
    state
        .window
        .record(state.messenger.as_ref(), chat, sent.message_id)
        .await;
    Ok(())
}

pub(crate) async fn reply_menu(state: &AppState, chat: ChatId, html: &str) -> Result<()> {
    let sent = state.messenger.send_menu(chat, html).await?;
    state
        .window
        .record(state.messenger.as_ref(), chat, sent.message_id)
        .await;
    Ok(())
}
