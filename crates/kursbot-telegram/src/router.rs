use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

use kursbot_core::{
    config::Config, conversation::StateStore, messaging::port::MessagingPort, rates::RateCache,
    registry::SubscriberRegistry, weather::WeatherProvider, window::MessageWindow,
};

use crate::handlers;
use crate::menu::Menu;

/// Everything a handler needs, injected once at startup. The stores are only
/// reachable through their documented operations.
pub struct AppState {
    pub cfg: Arc<Config>,
    pub rates: Arc<RateCache>,
    pub states: Arc<StateStore>,
    pub window: Arc<MessageWindow>,
    pub registry: Arc<SubscriberRegistry>,
    pub weather: Option<Arc<dyn WeatherProvider>>,
    pub messenger: Arc<dyn MessagingPort>,
    pub menu: Arc<Menu>,
    pub chat_locks: Arc<ChatLocks>,
}

/// Serializes message handling per chat, so one user's state transitions are
/// applied in the order their messages arrived.
#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub async fn run_polling(bot: Bot, state: Arc<AppState>) -> anyhow::Result<()> {
    if let Ok(me) = bot.get_me().await {
        info!("kursbot started: @{}", me.username());
    }
    let (currency, weather) = state.registry.counts().await;
    info!("subscribers loaded: {currency} currency, {weather} weather");

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
