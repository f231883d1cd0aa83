//! The persistent reply-keyboard menu.
//!
//! Raw button text is resolved to a typed `MenuIntent` here, once, at the
//! transport boundary. The core never compares label strings.

use teloxide::types::{ButtonRequest, KeyboardButton, KeyboardMarkup};

use kursbot_core::domain::{ConversionDirection, MenuIntent};

pub struct Menu {
    show_rates: String,
    usd_to_local: String,
    local_to_usd: String,
    eur_to_local: String,
    local_to_eur: String,
    forecast_now: String,
    send_location: String,
    currency_digest: String,
    weather_digest: String,
    help: String,
    local: String,
}

impl Menu {
    pub fn new(local_currency: &str) -> Self {
        let local = local_currency.to_string();
        Self {
            show_rates: "💵 Show rates".to_string(),
            usd_to_local: format!("🔄 USD → {local}"),
            local_to_usd: format!("🔄 {local} → USD"),
            eur_to_local: format!("💶 EUR → {local}"),
            local_to_eur: format!("💶 {local} → EUR"),
            forecast_now: "⛅ Weather now".to_string(),
            send_location: "📍 Send location".to_string(),
            currency_digest: "🔔 Daily rates on/off".to_string(),
            weather_digest: "🌦 Daily weather on/off".to_string(),
            help: "ℹ️ Help".to_string(),
            local,
        }
    }

    /// Map button text to its intent; `None` means ordinary free text.
    pub fn resolve(&self, text: &str) -> Option<MenuIntent> {
        let t = text.trim();
        if t == self.show_rates {
            Some(MenuIntent::ShowRates)
        } else if t == self.usd_to_local {
            Some(MenuIntent::Convert(ConversionDirection::UsdToLocal))
        } else if t == self.local_to_usd {
            Some(MenuIntent::Convert(ConversionDirection::LocalToUsd))
        } else if t == self.eur_to_local {
            Some(MenuIntent::Convert(ConversionDirection::EurToLocal))
        } else if t == self.local_to_eur {
            Some(MenuIntent::Convert(ConversionDirection::LocalToEur))
        } else if t == self.forecast_now {
            Some(MenuIntent::ForecastNow)
        } else if t == self.currency_digest {
            Some(MenuIntent::ToggleCurrencyDigest)
        } else if t == self.weather_digest {
            Some(MenuIntent::ToggleWeatherDigest)
        } else if t == self.help {
            Some(MenuIntent::Help)
        } else {
            None
        }
    }

    pub fn keyboard(&self) -> KeyboardMarkup {
        let rows = vec![
            vec![KeyboardButton::new(self.show_rates.clone())],
            vec![
                KeyboardButton::new(self.usd_to_local.clone()),
                KeyboardButton::new(self.local_to_usd.clone()),
            ],
            vec![
                KeyboardButton::new(self.eur_to_local.clone()),
                KeyboardButton::new(self.local_to_eur.clone()),
            ],
            vec![
                KeyboardButton::new(self.forecast_now.clone()),
                KeyboardButton::new(self.send_location.clone()).request(ButtonRequest::Location),
            ],
            vec![
                KeyboardButton::new(self.currency_digest.clone()),
                KeyboardButton::new(self.weather_digest.clone()),
            ],
            vec![KeyboardButton::new(self.help.clone())],
        ];
        KeyboardMarkup::new(rows).resize_keyboard(true)
    }

    pub fn help_html(&self) -> String {
        format!(
            "{} — current rates for 1 USD / 1 EUR\n\
             {} — you send a USD amount, I answer in {local}\n\
             {} — you send a {local} amount, I answer in USD\n\
             {} / {} — the same for EUR\n\
             {} — share a location, get a short forecast\n\
             {} — daily exchange-rate digest\n\
             {} — daily weather digest for your location",
            self.show_rates,
            self.usd_to_local,
            self.local_to_usd,
            self.eur_to_local,
            self.local_to_eur,
            self.forecast_now,
            self.currency_digest,
            self.weather_digest,
            local = self.local,
        )
    }
}
