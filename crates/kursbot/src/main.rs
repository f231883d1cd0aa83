use std::sync::Arc;

use teloxide::Bot;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use kursbot_core::{
    broadcast::DailyBroadcast,
    config::Config,
    conversation::StateStore,
    messaging::port::MessagingPort,
    rates::{RateCache, RateProvider},
    registry::SubscriberRegistry,
    weather::WeatherProvider,
    window::MessageWindow,
    Error,
};
use kursbot_providers::{ExchangeRateApi, OpenWeatherMap};
use kursbot_telegram::{
    menu::Menu,
    router::{AppState, ChatLocks},
    TelegramMessenger,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    kursbot_core::logging::init("kursbot")?;

    let cfg = Arc::new(Config::load()?);

    let rate_provider: Arc<dyn RateProvider> = Arc::new(ExchangeRateApi::new(
        &cfg.local_currency,
        cfg.http_timeout,
    ));
    let rates = Arc::new(RateCache::new(
        rate_provider,
        cfg.tracked_currencies.clone(),
    ));

    let weather: Option<Arc<dyn WeatherProvider>> = cfg
        .weather_api_key
        .clone()
        .map(|key| Arc::new(OpenWeatherMap::new(key, cfg.http_timeout)) as Arc<dyn WeatherProvider>);
    if weather.is_none() {
        warn!("WEATHER_API_KEY not set; weather features will answer \"not configured\"");
    }

    let registry = Arc::new(SubscriberRegistry::load(cfg.subscribers_file.clone()));

    let bot = Bot::new(cfg.bot_token.clone());
    let menu = Arc::new(Menu::new(&cfg.local_currency));
    let messenger: Arc<dyn MessagingPort> =
        Arc::new(TelegramMessenger::new(bot.clone(), menu.keyboard()));

    // Background loops: periodic rate refresh and the daily digest scheduler.
    let cancel = CancellationToken::new();
    let _refresh = rates.spawn_refresh_loop(cfg.rate_refresh_interval, cancel.clone());
    let broadcast = Arc::new(DailyBroadcast::new(
        &cfg,
        rates.clone(),
        registry.clone(),
        weather.clone(),
        messenger.clone(),
    ));
    let _daily = broadcast.spawn(cancel.clone());

    let _health = kursbot_gateway::spawn(cfg.health_port).await.map_err(Error::Io)?;

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        rates,
        states: Arc::new(StateStore::new()),
        window: Arc::new(MessageWindow::new(cfg.message_window_limit)),
        registry,
        weather,
        messenger,
        menu,
        chat_locks: Arc::new(ChatLocks::default()),
    });

    let result = kursbot_telegram::router::run_polling(bot, state)
        .await
        .map_err(|e| Error::Transport(format!("telegram polling failed: {e}")));

    cancel.cancel();
    result
}
