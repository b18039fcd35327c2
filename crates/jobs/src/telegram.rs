//! Telegram Bot API notifier.
//!
//! Thin `sendMessage` client; chat-bot command handling is not this
//! service's business, reminders are its only outbound traffic.

use afisha_common::{AppError, AppResult};
use afisha_core::Notifier;
use serde::Serialize;

/// Sends messages through the Telegram Bot API.
pub struct TelegramNotifier {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

impl TelegramNotifier {
    /// Create a notifier for the given bot token.
    #[must_use]
    pub fn new(bot_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("https://api.telegram.org/bot{bot_token}"),
        }
    }

    #[cfg(test)]
    fn with_base_url(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send_message(&self, chat_id: i64, text: &str) -> AppResult<()> {
        let response = self
            .http
            .post(format!("{}/sendMessage", self.base_url))
            .json(&SendMessageRequest { chat_id, text })
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Telegram request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Telegram sendMessage returned {status}: {body}"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The base URL embeds the bot token; keep it out of logs.
        f.debug_struct("TelegramNotifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn request_payload_shape() {
        let request = SendMessageRequest {
            chat_id: 42,
            text: "Reminder",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chat_id"], 42);
        assert_eq!(json["text"], "Reminder");
    }

    #[tokio::test]
    async fn unreachable_server_is_an_external_service_error() {
        // Port 9 (discard) is not listening.
        let notifier = TelegramNotifier::with_base_url("http://127.0.0.1:9/bot".to_string());
        let result = notifier.send_message(1, "hello").await;
        assert!(matches!(result, Err(AppError::ExternalService(_))));
    }
}
