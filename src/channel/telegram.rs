//! Telegram transport adapter.
//!
//! Long-polls the Bot API for updates and normalizes text messages and inline
//! button presses into [`InboundEvent`]s. Sending happens through
//! [`TelegramChannel::send_message`] with optional inline keyboards.

use super::{InboundEvent, InboundPayload};
use tokio::sync::mpsc;

/// Result type for Telegram operations.
pub type TelegramResult<T> = Result<T, TelegramError>;

/// Telegram transport error type.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Message send failed: {0}")]
    SendFailed(String),

    #[error("Unexpected API response: {0}")]
    InvalidResponse(String),
}

/// A single inline keyboard button, already rendered.
#[derive(Debug, Clone)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Telegram channel - long-polls the Bot API for updates.
pub struct TelegramChannel {
    bot_token: String,
    allowed_users: Vec<String>,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: String, allowed_users: Vec<String>) -> Self {
        Self {
            bot_token,
            allowed_users,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    fn is_user_allowed(&self, identity: &str) -> bool {
        self.allowed_users.iter().any(|u| u == "*" || u == identity)
    }

    fn is_any_user_allowed<'a, I>(&self, identities: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        identities.into_iter().any(|id| self.is_user_allowed(id))
    }

    /// Verify the bot token by calling getMe.
    pub async fn init(&self) -> TelegramResult<()> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(TelegramError::Auth(format!("Invalid bot token: {err}")));
        }

        tracing::info!("Telegram channel initialized");
        Ok(())
    }

    /// Send a message, optionally with an inline keyboard. Returns the
    /// message id.
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<Vec<Vec<InlineButton>>>,
    ) -> TelegramResult<i64> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        if let Some(rows) = keyboard {
            let rendered: Vec<Vec<serde_json::Value>> = rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|btn| {
                            serde_json::json!({
                                "text": btn.text,
                                "callback_data": btn.callback_data
                            })
                        })
                        .collect()
                })
                .collect();
            body["reply_markup"] = serde_json::json!({ "inline_keyboard": rendered });
        }

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(TelegramError::SendFailed(format!("sendMessage failed: {err}")));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TelegramError::InvalidResponse(e.to_string()))?;
        data.get("result")
            .and_then(|r| r.get("message_id"))
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| TelegramError::InvalidResponse("missing message_id".into()))
    }

    /// Acknowledge a button click so the client stops its spinner.
    pub async fn answer_callback_query(&self, callback_query_id: &str) -> TelegramResult<()> {
        let body = serde_json::json!({ "callback_query_id": callback_query_id });

        let resp = self
            .client
            .post(self.api_url("answerCallbackQuery"))
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(TelegramError::SendFailed(format!(
                "answerCallbackQuery failed: {err}"
            )));
        }
        Ok(())
    }

    /// Edit the text of an existing message.
    pub async fn edit_message_text(
        &self,
        chat_id: &str,
        message_id: i64,
        text: &str,
    ) -> TelegramResult<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });

        let resp = self
            .client
            .post(self.api_url("editMessageText"))
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(TelegramError::SendFailed(format!("editMessageText failed: {err}")));
        }
        Ok(())
    }

    /// Normalize one update into an inbound event, applying the allow-list.
    fn parse_update(&self, update: &serde_json::Value) -> Option<InboundEvent> {
        if let Some(callback) = update.get("callback_query") {
            let query_id = callback.get("id")?.as_str()?.to_string();
            let data = callback.get("data")?.as_str()?.to_string();

            let from = callback.get("from")?;
            let user_id = from.get("id")?.as_i64()?.to_string();
            let username = from.get("username").and_then(|u| u.as_str()).unwrap_or("unknown");

            let chat_id = callback
                .get("message")?
                .get("chat")?
                .get("id")?
                .as_i64()?
                .to_string();

            if !self.is_any_user_allowed([username, user_id.as_str()]) {
                tracing::warn!(user = %username, "ignoring callback from unauthorized user");
                return None;
            }

            return Some(InboundEvent {
                id: uuid::Uuid::new_v4().to_string(),
                owner: user_id,
                chat_id,
                payload: InboundPayload::Callback { query_id, data },
            });
        }

        let message = update.get("message")?;
        let text = message.get("text")?.as_str()?.to_string();

        let from = message.get("from")?;
        let user_id = from.get("id")?.as_i64()?.to_string();
        let username = from.get("username").and_then(|u| u.as_str()).unwrap_or("unknown");

        let chat_id = message.get("chat")?.get("id")?.as_i64()?.to_string();

        if !self.is_any_user_allowed([username, user_id.as_str()]) {
            tracing::warn!(user = %username, "ignoring message from unauthorized user");
            return None;
        }

        Some(InboundEvent {
            id: uuid::Uuid::new_v4().to_string(),
            owner: user_id,
            chat_id,
            payload: InboundPayload::Text { text },
        })
    }

    /// Long-poll for updates and forward normalized events to `tx`.
    ///
    /// Poll errors back off and retry; this loop only ends when the receiver
    /// side is dropped.
    pub async fn listen(&self, tx: mpsc::Sender<InboundEvent>) {
        let mut offset: i64 = 0;

        tracing::info!("Telegram channel listening for updates...");

        loop {
            let body = serde_json::json!({
                "offset": offset,
                "timeout": 30,
                "allowed_updates": ["message", "callback_query"]
            });

            let resp = match self
                .client
                .post(self.api_url("getUpdates"))
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            let data: serde_json::Value = match resp.json().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Telegram parse error: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            if let Some(results) = data.get("result").and_then(serde_json::Value::as_array) {
                for update in results {
                    if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64) {
                        offset = uid + 1;
                    }

                    if let Some(event) = self.parse_update(update) {
                        if tx.send(event).await.is_err() {
                            tracing::info!("event receiver dropped, stopping Telegram listener");
                            return;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telegram_api_url() {
        let ch = TelegramChannel::new("123:ABC".into(), vec![]);
        assert_eq!(
            ch.api_url("getMe"),
            "https://api.telegram.org/bot123:ABC/getMe"
        );
    }

    #[test]
    fn user_allowed_wildcard() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        assert!(ch.is_user_allowed("anyone"));
    }

    #[test]
    fn user_allowed_specific() {
        let ch = TelegramChannel::new("t".into(), vec!["alice".into(), "42".into()]);
        assert!(ch.is_user_allowed("alice"));
        assert!(ch.is_any_user_allowed(["bob", "42"]));
        assert!(!ch.is_user_allowed("eve"));
    }

    #[test]
    fn parse_text_message_update() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        let update = serde_json::json!({
            "update_id": 10,
            "message": {
                "chat": { "id": 555 },
                "from": { "id": 42, "username": "ana" },
                "text": "/newevent"
            }
        });

        let event = ch.parse_update(&update).unwrap();
        assert_eq!(event.owner, "42");
        assert_eq!(event.chat_id, "555");
        assert!(matches!(event.payload, InboundPayload::Text { ref text } if text == "/newevent"));
    }

    #[test]
    fn parse_callback_update() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        let update = serde_json::json!({
            "update_id": 11,
            "callback_query": {
                "id": "q1",
                "from": { "id": 42, "username": "ana" },
                "message": { "message_id": 9, "chat": { "id": 555 } },
                "data": "ev:tpl:sunday"
            }
        });

        let event = ch.parse_update(&update).unwrap();
        assert_eq!(event.owner, "42");
        assert!(matches!(
            event.payload,
            InboundPayload::Callback { ref data, .. } if data == "ev:tpl:sunday"
        ));
    }

    #[test]
    fn parse_rejects_unauthorized_user() {
        let ch = TelegramChannel::new("t".into(), vec!["alice".into()]);
        let update = serde_json::json!({
            "update_id": 12,
            "message": {
                "chat": { "id": 555 },
                "from": { "id": 42, "username": "eve" },
                "text": "hi"
            }
        });
        assert!(ch.parse_update(&update).is_none());
    }

    #[test]
    fn parse_ignores_non_text_messages() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        let update = serde_json::json!({
            "update_id": 13,
            "message": {
                "chat": { "id": 555 },
                "from": { "id": 42 },
                "sticker": { "file_id": "abc" }
            }
        });
        assert!(ch.parse_update(&update).is_none());
    }
}
