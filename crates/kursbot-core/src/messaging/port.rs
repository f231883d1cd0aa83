use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::MessagingCapabilities,
    Result,
};

/// Cross-messenger port.
///
/// Telegram is the first implementation; the shape is kept small so future
/// adapters can fit behind the same interface with capability flags.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    /// Send an HTML message without touching the reply keyboard.
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Send an HTML message with the persistent menu keyboard attached.
    async fn send_menu(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;
}
