//! Forecast client (OpenWeatherMap 5-day / 3-hour forecast shape).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;

use kursbot_core::{
    domain::Coordinate,
    weather::{ForecastInterval, WeatherProvider},
    Error, Result,
};

const API_BASE: &str = "https://api.openweathermap.org/data/2.5";

pub struct OpenWeatherMap {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl OpenWeatherMap {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::with_base_url(API_BASE, api_key, timeout)
    }

    pub fn with_base_url(base_url: &str, api_key: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMap {
    async fn fetch_forecast(&self, coordinate: Coordinate) -> Result<Vec<ForecastInterval>> {
        let resp = self
            .client
            .get(format!("{}/forecast", self.base_url))
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("forecast api request failed: {e}")))?;

        let status = resp.status();
        let json: Value = resp
            .json()
            .await
            .map_err(|e| Error::Provider(format!("forecast api sent invalid json: {e}")))?;

        if !status.is_success() {
            let msg = json["message"].as_str().unwrap_or("unknown error");
            return Err(Error::Provider(format!("forecast api: {msg}")));
        }

        let list = json["list"].as_array().map(|a| a.as_slice()).unwrap_or(&[]);

        let intervals = list
            .iter()
            .filter_map(|entry| {
                let timestamp =
                    DateTime::<Utc>::from_timestamp(entry["dt"].as_i64()?, 0)?;
                Some(ForecastInterval {
                    timestamp,
                    temperature_c: entry["main"]["temp"].as_f64()?,
                    condition: entry["weather"][0]["main"]
                        .as_str()
                        .unwrap_or("unknown")
                        .to_string(),
                    wind_speed_ms: entry["wind"]["speed"].as_f64().unwrap_or(0.0),
                })
            })
            .collect();

        Ok(intervals)
    }
}
