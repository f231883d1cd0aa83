//! Wall-clock-driven daily digest delivery.
//!
//! A single long-lived loop polls the local time once a minute and fires when
//! it matches the configured hour and minute, then holds a cooldown so the
//! same minute cannot fire twice. Delivery is sequential and paced. A
//! recipient whose delivery fails at the transport level is pruned from the
//! registry in one batch at the end of the pass; an upstream fetch failure
//! only skips that recipient for the day.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local, Timelike};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    config::Config,
    domain::ChatId,
    formatting,
    messaging::port::MessagingPort,
    rates::RateCache,
    registry::SubscriberRegistry,
    weather::{self, WeatherProvider},
    Result,
};

const POLL_INTERVAL: Duration = Duration::from_secs(60);

pub struct DailyBroadcast {
    hour: u32,
    minute: u32,
    pacing: Duration,
    cooldown: Duration,
    local_currency: String,
    rates: Arc<RateCache>,
    registry: Arc<SubscriberRegistry>,
    weather: Option<Arc<dyn WeatherProvider>>,
    messenger: Arc<dyn MessagingPort>,
}

impl DailyBroadcast {
    pub fn new(
        cfg: &Config,
        rates: Arc<RateCache>,
        registry: Arc<SubscriberRegistry>,
        weather: Option<Arc<dyn WeatherProvider>>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            hour: cfg.broadcast_hour,
            minute: cfg.broadcast_minute,
            pacing: cfg.broadcast_pacing,
            cooldown: cfg.broadcast_cooldown,
            local_currency: cfg.local_currency.clone(),
            rates,
            registry,
            weather,
            messenger,
        }
    }

    /// Minute-exact match against the configured local firing time.
    pub fn due(&self, now: DateTime<Local>) -> bool {
        now.hour() == self.hour && now.minute() == self.minute
    }

    /// Run the scheduler until cancelled. No iteration error is fatal.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        info!(
            "daily broadcast scheduled for {:02}:{:02} local time",
            self.hour, self.minute
        );
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(POLL_INTERVAL) => {}
                }

                if !self.due(Local::now()) {
                    continue;
                }

                info!("daily broadcast firing");
                if let Err(e) = self.fire_once().await {
                    error!("broadcast pass failed: {e}");
                }

                // Cooldown so a slow pass or re-entrant poll cannot fire the
                // same minute window twice.
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(self.cooldown) => {}
                }
            }
        })
    }

    /// One full delivery pass over both subscriber sets.
    pub async fn fire_once(&self) -> Result<()> {
        let mut pruned: Vec<ChatId> = Vec::new();

        self.deliver_currency_digest(&mut pruned).await;
        self.deliver_weather_digest(&mut pruned).await;

        if !pruned.is_empty() {
            pruned.sort_by_key(|c| c.0);
            pruned.dedup_by_key(|c| c.0);
            let dropped = self.registry.prune(&pruned).await?;
            info!("pruned {dropped} registry entries for unreachable recipients");
        }

        Ok(())
    }

    async fn deliver_currency_digest(&self, pruned: &mut Vec<ChatId>) {
        let snapshot = self.rates.snapshot().await;
        if snapshot.is_empty() {
            info!("no rates cached yet, skipping currency digest");
            return;
        }

        let digest = formatting::rate_digest(&snapshot, &self.local_currency);
        for chat in self.registry.currency_subscribers().await {
            match self.messenger.send_html(chat, &digest).await {
                Ok(_) => {}
                Err(e) => {
                    warn!("currency digest undeliverable to {}: {e}", chat.0);
                    pruned.push(chat);
                }
            }
            sleep(self.pacing).await;
        }
    }

    async fn deliver_weather_digest(&self, pruned: &mut Vec<ChatId>) {
        let Some(provider) = &self.weather else {
            return;
        };

        for (chat, coordinate) in self.registry.weather_subscribers().await {
            // A fetch failure may be transient or upstream; skip this
            // recipient today and keep the subscription.
            let intervals = match provider.fetch_forecast(coordinate).await {
                Ok(v) => v,
                Err(e) => {
                    warn!("forecast fetch failed for {}: {e}", chat.0);
                    continue;
                }
            };

            let samples = weather::daily_samples(&intervals, weather::FORECAST_DAYS);
            if samples.is_empty() {
                warn!("empty forecast for {}", chat.0);
                continue;
            }

            let digest = formatting::weather_digest(&samples);
            match self.messenger.send_html(chat, &digest).await {
                Ok(_) => {}
                Err(e) => {
                    warn!("weather digest undeliverable to {}: {e}", chat.0);
                    pruned.push(chat);
                }
            }
            sleep(self.pacing).await;
        }
    }
}
