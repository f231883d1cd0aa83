//! Bounded per-chat history of emitted message ids.
//!
//! Keeps chats visually tidy by deleting the oldest messages once the window
//! exceeds its cap. Remote deletion is best-effort: a message that is already
//! gone (or undeletable) still leaves the local window.

use std::collections::{HashMap, VecDeque};

use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::port::MessagingPort,
};

pub struct MessageWindow {
    limit: usize,
    inner: Mutex<HashMap<i64, VecDeque<MessageId>>>,
}

impl MessageWindow {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Append a message id and evict past the cap, oldest first.
    pub async fn record(&self, messenger: &dyn MessagingPort, chat_id: ChatId, id: MessageId) {
        let evicted = {
            let mut map = self.inner.lock().await;
            let window = map.entry(chat_id.0).or_default();
            window.push_back(id);

            let mut evicted = Vec::new();
            while window.len() > self.limit {
                if let Some(old) = window.pop_front() {
                    evicted.push(old);
                }
            }
            evicted
        };

        for old in evicted {
            let msg = MessageRef {
                chat_id,
                message_id: old,
            };
            if let Err(e) = messenger.delete_message(msg).await {
                debug!("could not delete old message {}: {e}", old.0);
            }
        }
    }

    pub async fn len(&self, chat_id: ChatId) -> usize {
        self.inner
            .lock()
            .await
            .get(&chat_id.0)
            .map(|w| w.len())
            .unwrap_or(0)
    }

    pub async fn is_empty(&self, chat_id: ChatId) -> bool {
        self.len(chat_id).await == 0
    }
}
