//! Durable subscriber registry.
//!
//! Two independent sets: currency-digest subscribers, and weather-digest
//! subscribers with their stored coordinate. Every mutation persists the
//! whole registry before the in-memory state is committed, so a crash right
//! after a successful call never loses that mutation. The registry is small
//! enough that a full-file rewrite per change is fine.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::{
    domain::{ChatId, Coordinate},
    Result,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct RegistryData {
    #[serde(default)]
    currency: BTreeSet<i64>,
    #[serde(default)]
    weather: BTreeMap<i64, Coordinate>,
}

pub struct SubscriberRegistry {
    path: PathBuf,
    inner: Mutex<RegistryData>,
}

impl SubscriberRegistry {
    /// Load from disk. A missing, empty, or malformed file yields an empty
    /// registry rather than a startup failure.
    pub fn load(path: PathBuf) -> Self {
        let data = match fs::read_to_string(&path) {
            Ok(txt) if !txt.trim().is_empty() => match serde_json::from_str(&txt) {
                Ok(data) => data,
                Err(e) => {
                    warn!("subscriber file is malformed, starting empty: {e}");
                    RegistryData::default()
                }
            },
            _ => RegistryData::default(),
        };

        Self {
            path,
            inner: Mutex::new(data),
        }
    }

    /// Toggle currency-digest membership. Returns whether the user is now
    /// subscribed.
    pub async fn toggle_currency(&self, chat: ChatId) -> Result<bool> {
        let mut guard = self.inner.lock().await;
        let mut next = guard.clone();
        let subscribed = if next.currency.remove(&chat.0) {
            false
        } else {
            next.currency.insert(chat.0);
            true
        };
        self.persist(&next)?;
        *guard = next;
        Ok(subscribed)
    }

    /// Idempotent add; returns true when the user was newly added.
    pub async fn subscribe_currency(&self, chat: ChatId) -> Result<bool> {
        let mut guard = self.inner.lock().await;
        let mut next = guard.clone();
        let added = next.currency.insert(chat.0);
        self.persist(&next)?;
        *guard = next;
        Ok(added)
    }

    /// Idempotent remove; returns true when the user was a member.
    pub async fn unsubscribe_currency(&self, chat: ChatId) -> Result<bool> {
        let mut guard = self.inner.lock().await;
        let mut next = guard.clone();
        let removed = next.currency.remove(&chat.0);
        self.persist(&next)?;
        *guard = next;
        Ok(removed)
    }

    /// Insert or overwrite the stored coordinate for a weather subscriber.
    pub async fn subscribe_weather(&self, chat: ChatId, coordinate: Coordinate) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let mut next = guard.clone();
        next.weather.insert(chat.0, coordinate);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    pub async fn unsubscribe_weather(&self, chat: ChatId) -> Result<bool> {
        let mut guard = self.inner.lock().await;
        let mut next = guard.clone();
        let removed = next.weather.remove(&chat.0).is_some();
        self.persist(&next)?;
        *guard = next;
        Ok(removed)
    }

    pub async fn is_currency_subscriber(&self, chat: ChatId) -> bool {
        self.inner.lock().await.currency.contains(&chat.0)
    }

    pub async fn is_weather_subscriber(&self, chat: ChatId) -> bool {
        self.inner.lock().await.weather.contains_key(&chat.0)
    }

    pub async fn currency_subscribers(&self) -> Vec<ChatId> {
        self.inner
            .lock()
            .await
            .currency
            .iter()
            .map(|&id| ChatId(id))
            .collect()
    }

    pub async fn weather_subscribers(&self) -> Vec<(ChatId, Coordinate)> {
        self.inner
            .lock()
            .await
            .weather
            .iter()
            .map(|(&id, &coord)| (ChatId(id), coord))
            .collect()
    }

    pub async fn counts(&self) -> (usize, usize) {
        let guard = self.inner.lock().await;
        (guard.currency.len(), guard.weather.len())
    }

    /// Remove every listed subscriber from both sets in one batch, persisting
    /// once. Returns how many entries were dropped.
    pub async fn prune(&self, chats: &[ChatId]) -> Result<usize> {
        let mut guard = self.inner.lock().await;
        let mut next = guard.clone();
        let mut dropped = 0usize;
        for chat in chats {
            if next.currency.remove(&chat.0) {
                dropped += 1;
            }
            if next.weather.remove(&chat.0).is_some() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            self.persist(&next)?;
            *guard = next;
        }
        Ok(dropped)
    }

    fn persist(&self, data: &RegistryData) -> Result<()> {
        let txt = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, txt)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_registry() -> (tempfile::TempDir, SubscriberRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.json");
        let registry = SubscriberRegistry::load(path);
        (dir, registry)
    }

    #[tokio::test]
    async fn toggle_parity_matches_membership() {
        let (_dir, registry) = temp_registry();
        let chat = ChatId(42);

        assert!(registry.toggle_currency(chat).await.unwrap());
        assert!(registry.is_currency_subscriber(chat).await);

        assert!(!registry.toggle_currency(chat).await.unwrap());
        assert!(!registry.is_currency_subscriber(chat).await);

        assert!(registry.toggle_currency(chat).await.unwrap());
        assert!(registry.is_currency_subscriber(chat).await);
    }

    #[tokio::test]
    async fn subscribe_and_unsubscribe_are_idempotent() {
        let (_dir, registry) = temp_registry();
        let chat = ChatId(42);

        assert!(registry.subscribe_currency(chat).await.unwrap());
        assert!(!registry.subscribe_currency(chat).await.unwrap());
        assert!(registry.unsubscribe_currency(chat).await.unwrap());
        assert!(!registry.unsubscribe_currency(chat).await.unwrap());
    }

    #[tokio::test]
    async fn every_mutation_survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.json");

        let registry = SubscriberRegistry::load(path.clone());
        registry.subscribe_currency(ChatId(1)).await.unwrap();
        let reloaded = SubscriberRegistry::load(path.clone());
        assert!(reloaded.is_currency_subscriber(ChatId(1)).await);

        registry
            .subscribe_weather(
                ChatId(2),
                Coordinate {
                    latitude: 41.3,
                    longitude: 69.25,
                },
            )
            .await
            .unwrap();
        let reloaded = SubscriberRegistry::load(path.clone());
        assert!(reloaded.is_weather_subscriber(ChatId(2)).await);

        registry.unsubscribe_currency(ChatId(1)).await.unwrap();
        let reloaded = SubscriberRegistry::load(path);
        assert!(!reloaded.is_currency_subscriber(ChatId(1)).await);
        assert!(reloaded.is_weather_subscriber(ChatId(2)).await);
    }

    #[tokio::test]
    async fn round_trips_mixed_subscriber_sets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.json");

        let registry = SubscriberRegistry::load(path.clone());
        for id in [1, 2, 3] {
            registry.subscribe_currency(ChatId(id)).await.unwrap();
        }
        for (id, lat) in [(10, 41.3), (11, 51.5)] {
            registry
                .subscribe_weather(
                    ChatId(id),
                    Coordinate {
                        latitude: lat,
                        longitude: -0.1,
                    },
                )
                .await
                .unwrap();
        }

        let reloaded = SubscriberRegistry::load(path);
        assert_eq!(reloaded.counts().await, (3, 2));
        let weather = reloaded.weather_subscribers().await;
        assert_eq!(weather.len(), 2);
        assert_eq!(weather[0].0, ChatId(10));
        assert!((weather[0].1.latitude - 41.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_and_malformed_files_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();

        let missing = SubscriberRegistry::load(dir.path().join("nope.json"));
        assert_eq!(missing.counts().await, (0, 0));

        let corrupt_path = dir.path().join("corrupt.json");
        fs::write(&corrupt_path, "{not json").unwrap();
        let corrupt = SubscriberRegistry::load(corrupt_path);
        assert_eq!(corrupt.counts().await, (0, 0));

        let empty_path = dir.path().join("empty.json");
        fs::write(&empty_path, "").unwrap();
        let empty = SubscriberRegistry::load(empty_path);
        assert_eq!(empty.counts().await, (0, 0));
    }

    #[tokio::test]
    async fn prune_drops_from_both_sets_in_one_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.json");

        let registry = SubscriberRegistry::load(path.clone());
        registry.subscribe_currency(ChatId(1)).await.unwrap();
        registry.subscribe_currency(ChatId(2)).await.unwrap();
        registry
            .subscribe_weather(
                ChatId(1),
                Coordinate {
                    latitude: 0.0,
                    longitude: 0.0,
                },
            )
            .await
            .unwrap();

        let dropped = registry.prune(&[ChatId(1)]).await.unwrap();
        assert_eq!(dropped, 2);
        assert_eq!(registry.counts().await, (1, 0));

        let reloaded = SubscriberRegistry::load(path);
        assert_eq!(reloaded.counts().await, (1, 0));
        assert!(reloaded.is_currency_subscriber(ChatId(2)).await);
    }
}
