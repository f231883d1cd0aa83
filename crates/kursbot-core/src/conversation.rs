//! Per-user conversation state machine.
//!
//! A user has at most one active dialogue; starting a new one overwrites the
//! previous (never stacks). Menu intents are resolved before this store is
//! consulted, so a recognized button always escapes a stuck flow.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{
    domain::{ConversionDirection, LocationPurpose, UserId},
    formatting,
    rates::RateCache,
};

/// Which multi-step dialogue a user is currently in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogState {
    AwaitingAmount(ConversionDirection),
    AwaitingLocation(LocationPurpose),
}

/// What the caller should do after feeding free text to the state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    /// No dialogue in progress; show the default menu prompt.
    Idle,
    /// Dialogue finished; reply with this line. State has been cleared.
    Done(String),
    /// Input rejected; dialogue stays active, reply with this prompt.
    Retry(String),
}

#[derive(Default)]
pub struct StateStore {
    inner: Mutex<HashMap<i64, DialogState>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a dialogue, overwriting any prior state for this user.
    pub async fn begin(&self, user: UserId, state: DialogState) {
        self.inner.lock().await.insert(user.0, state);
    }

    pub async fn end(&self, user: UserId) {
        self.inner.lock().await.remove(&user.0);
    }

    pub async fn current(&self, user: UserId) -> Option<DialogState> {
        self.inner.lock().await.get(&user.0).copied()
    }

    /// Consume an awaiting-location state, if that is what the user is in.
    ///
    /// Location events arrive on their own update path, so an active
    /// amount-entry dialogue is left untouched.
    pub async fn take_location(&self, user: UserId) -> Option<LocationPurpose> {
        let mut map = self.inner.lock().await;
        match map.get(&user.0) {
            Some(DialogState::AwaitingLocation(purpose)) => {
                let purpose = *purpose;
                map.remove(&user.0);
                Some(purpose)
            }
            _ => None,
        }
    }

    /// Feed one free-text message through the active dialogue.
    pub async fn advance(
        &self,
        user: UserId,
        text: &str,
        rates: &RateCache,
        local_currency: &str,
    ) -> Advance {
        let Some(state) = self.current(user).await else {
            return Advance::Idle;
        };

        match state {
            DialogState::AwaitingLocation(_) => Advance::Retry(
                "Share a location with the 📍 button to continue.".to_string(),
            ),
            DialogState::AwaitingAmount(direction) => {
                let Some(amount) = parse_amount(text) else {
                    return Advance::Retry(
                        "Please send a number, e.g. 125 or 10.5.".to_string(),
                    );
                };

                let Some(factor) = rates.ensure_fresh(direction.foreign_code()).await else {
                    // Transient upstream failure: keep the dialogue so the
                    // user can retry once the cache fills.
                    return Advance::Retry(
                        "Sorry, rates are not available right now. Try again in a minute."
                            .to_string(),
                    );
                };

                self.end(user).await;
                Advance::Done(formatting::conversion_line(
                    amount,
                    direction,
                    factor,
                    local_currency,
                ))
            }
        }
    }
}

/// Amount parsing; a decimal comma is accepted ("10,5" == "10.5").
fn parse_amount(text: &str) -> Option<f64> {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::RateProvider;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::collections::HashMap as StdHashMap;
    use std::sync::Arc;

    struct FixedProvider(Option<f64>);

    #[async_trait]
    impl RateProvider for FixedProvider {
        async fn fetch_rates(&self) -> Result<StdHashMap<String, f64>> {
            match self.0 {
                // Provider quotes foreign-per-local.
                Some(local_per_usd) => {
                    Ok([("USD".to_string(), 1.0 / local_per_usd)].into_iter().collect())
                }
                None => Err(Error::Provider("upstream down".to_string())),
            }
        }
    }

    fn rates_with_usd(local_per_usd: Option<f64>) -> RateCache {
        RateCache::new(
            Arc::new(FixedProvider(local_per_usd)),
            vec!["USD".to_string()],
        )
    }

    #[tokio::test]
    async fn no_state_yields_idle() {
        let store = StateStore::new();
        let rates = rates_with_usd(None);
        let out = store.advance(UserId(1), "hello", &rates, "UZS").await;
        assert_eq!(out, Advance::Idle);
    }

    #[tokio::test]
    async fn amount_entry_completes_and_clears_state() {
        let store = StateStore::new();
        let rates = rates_with_usd(Some(12_700.0));
        rates.refresh().await.unwrap();

        store
            .begin(UserId(1), DialogState::AwaitingAmount(ConversionDirection::UsdToLocal))
            .await;

        let out = store.advance(UserId(1), "10", &rates, "UZS").await;
        assert_eq!(out, Advance::Done("10.00 USD = 127000.00 UZS".to_string()));
        assert_eq!(store.current(UserId(1)).await, None);
    }

    #[tokio::test]
    async fn malformed_amount_preserves_state() {
        let store = StateStore::new();
        let rates = rates_with_usd(Some(12_700.0));
        rates.refresh().await.unwrap();

        store
            .begin(UserId(1), DialogState::AwaitingAmount(ConversionDirection::LocalToUsd))
            .await;

        let out = store.advance(UserId(1), "ten dollars", &rates, "UZS").await;
        assert!(matches!(out, Advance::Retry(_)));
        assert_eq!(
            store.current(UserId(1)).await,
            Some(DialogState::AwaitingAmount(ConversionDirection::LocalToUsd))
        );
    }

    #[tokio::test]
    async fn unavailable_rate_preserves_state() {
        let store = StateStore::new();
        let rates = rates_with_usd(None);

        store
            .begin(UserId(1), DialogState::AwaitingAmount(ConversionDirection::UsdToLocal))
            .await;

        let out = store.advance(UserId(1), "10", &rates, "UZS").await;
        assert!(matches!(out, Advance::Retry(_)));
        assert!(store.current(UserId(1)).await.is_some());
    }

    #[tokio::test]
    async fn begin_overwrites_previous_dialogue() {
        let store = StateStore::new();
        store
            .begin(UserId(1), DialogState::AwaitingAmount(ConversionDirection::UsdToLocal))
            .await;
        store
            .begin(
                UserId(1),
                DialogState::AwaitingLocation(LocationPurpose::WeatherSubscription),
            )
            .await;

        assert_eq!(
            store.current(UserId(1)).await,
            Some(DialogState::AwaitingLocation(LocationPurpose::WeatherSubscription))
        );
    }

    #[tokio::test]
    async fn take_location_only_consumes_location_dialogues() {
        let store = StateStore::new();

        store
            .begin(UserId(1), DialogState::AwaitingAmount(ConversionDirection::UsdToLocal))
            .await;
        assert_eq!(store.take_location(UserId(1)).await, None);
        assert!(store.current(UserId(1)).await.is_some());

        store
            .begin(
                UserId(1),
                DialogState::AwaitingLocation(LocationPurpose::OneShotForecast),
            )
            .await;
        assert_eq!(
            store.take_location(UserId(1)).await,
            Some(LocationPurpose::OneShotForecast)
        );
        assert_eq!(store.current(UserId(1)).await, None);
    }

    #[test]
    fn decimal_comma_is_accepted() {
        assert_eq!(parse_amount("10,5"), Some(10.5));
        assert_eq!(parse_amount(" 125 "), Some(125.0));
        assert_eq!(parse_amount("abc"), None);
    }
}
