//! Exchange-rate client (open.er-api.com response shape).

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use kursbot_core::{rates::RateProvider, Error, Result};

const API_BASE: &str = "https://open.er-api.com/v6/latest";

pub struct ExchangeRateApi {
    client: Client,
    base_url: String,
    base_currency: String,
    timeout: Duration,
}

impl ExchangeRateApi {
    /// `base_currency` is the local currency; the API quotes how many units
    /// of each foreign currency one local unit buys.
    pub fn new(base_currency: &str, timeout: Duration) -> Self {
        Self::with_base_url(API_BASE, base_currency, timeout)
    }

    pub fn with_base_url(base_url: &str, base_currency: &str, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            base_currency: base_currency.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApi {
    async fn fetch_rates(&self) -> Result<HashMap<String, f64>> {
        let url = format!("{}/{}", self.base_url, self.base_currency);
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("currency api request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Provider(format!("currency api returned {status}")));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| Error::Provider(format!("currency api sent invalid json: {e}")))?;

        let Some(rates) = json.get("rates").and_then(|r| r.as_object()) else {
            return Err(Error::Provider(
                "currency api response missing rates".to_string(),
            ));
        };

        Ok(rates
            .iter()
            .filter_map(|(code, v)| v.as_f64().map(|f| (code.clone(), f)))
            .collect())
    }
}
