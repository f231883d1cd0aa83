use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use kursbot_core::{
    domain::{ChatId, Coordinate, LocationPurpose, UserId},
    formatting,
    weather::{self, FORECAST_DAYS},
    Result,
};

use crate::router::AppState;

use super::text::{reply, reply_menu, DEFAULT_PROMPT, WEATHER_NOT_CONFIGURED};

pub async fn handle_location(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(location) = msg.location() else {
        return Ok(());
    };

    let chat = ChatId(msg.chat.id.0);
    let user = UserId(user.id.0 as i64);
    let coordinate = Coordinate {
        latitude: location.latitude,
        longitude: location.longitude,
    };

    if let Err(e) = dispatch_location(&state, chat, user, coordinate).await {
        warn!("location handler failed for chat {}: {e}", chat.0);
    }
    Ok(())
}

pub(crate) async fn dispatch_location(
    state: &AppState,
    chat: ChatId,
    user: UserId,
    coordinate: Coordinate,
) -> Result<()> {
    // A location only means something inside an awaiting-location dialogue.
    let Some(purpose) = state.states.take_location(user).await else {
        return reply_menu(state, chat, DEFAULT_PROMPT).await;
    };

    match purpose {
        LocationPurpose::OneShotForecast => {
            let Some(provider) = &state.weather else {
                return reply(state, chat, WEATHER_NOT_CONFIGURED).await;
            };
            match provider.fetch_forecast(coordinate).await {
                Ok(intervals) => {
                    let samples = weather::daily_samples(&intervals, FORECAST_DAYS);
                    if samples.is_empty() {
                        reply(state, chat, "Sorry, the forecast is empty right now.").await
                    } else {
                        reply(state, chat, &formatting::weather_digest(&samples)).await
                    }
                }
                Err(e) => {
                    warn!("one-shot forecast fetch failed: {e}");
                    reply(
                        state,
                        chat,
                        "Sorry, the forecast is unavailable right now. Try again later.",
                    )
                    .await
                }
            }
        }

        LocationPurpose::WeatherSubscription => {
            state.registry.subscribe_weather(chat, coordinate).await?;
            reply(state, chat, "✅ Daily weather digest enabled for this location.").await
        }
    }
}
