//! Notification seam.
//!
//! The sweeper only knows how to hand a message to a chat; the actual
//! messaging channel (the Telegram Bot API in production) lives behind
//! this trait.

use std::sync::Arc;

use afisha_common::AppResult;

/// Delivers a text message to a chat.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Send `text` to the chat identified by `chat_id`.
    async fn send_message(&self, chat_id: i64, text: &str) -> AppResult<()>;
}

/// Shared notifier handle.
pub type SharedNotifier = Arc<dyn Notifier>;

/// Notifier that drops every message. Used in tests and when the bot
/// token is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait::async_trait]
impl Notifier for NoopNotifier {
    async fn send_message(&self, chat_id: i64, _text: &str) -> AppResult<()> {
        tracing::debug!(chat_id, "Dropping notification (noop notifier)");
        Ok(())
    }
}
