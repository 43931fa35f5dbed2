//! Telegram channel — long-polls the Bot API for messages and button
//! presses, and sends replies with inline keyboards.

use async_trait::async_trait;

use crate::channels::{
    AttachmentKind, Channel, EventPayload, EventStream, InboundEvent, Keyboard, Outbound,
};
use crate::error::ChannelError;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Telegram channel — connects to the Bot API via long-polling.
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

    /// Check if a username or numeric id is in the allowed list.
    pub fn is_user_allowed(&self, identity: &str) -> bool {
        self.allowed_users.iter().any(|u| u == "*" || u == identity)
    }

    /// Send a text message, Markdown-first with plain-text fallback.
    /// Splits messages over Telegram's 4096-char limit; the keyboard is
    /// attached to the final chunk so the buttons land under the text.
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        let chunks = split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.iter().enumerate() {
            let markup = if i == last { keyboard } else { None };
            self.send_message_chunk(chat_id, chunk, markup).await?;
        }
        Ok(())
    }

    async fn send_message_chunk(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChannelError> {
        let mut markdown_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown"
        });
        if let Some(kb) = keyboard {
            markdown_body["reply_markup"] = reply_markup(kb);
        }

        let markdown_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&markdown_body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if markdown_resp.status().is_success() {
            return Ok(());
        }

        let markdown_status = markdown_resp.status();
        tracing::warn!(
            status = ?markdown_status,
            "Telegram sendMessage with Markdown failed; retrying without parse_mode"
        );

        let mut plain_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(kb) = keyboard {
            plain_body["reply_markup"] = reply_markup(kb);
        }
        let plain_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&plain_body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !plain_resp.status().is_success() {
            let plain_err = plain_resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!(
                    "sendMessage failed (markdown: {}, plain: {})",
                    markdown_status, plain_err
                ),
            });
        }

        Ok(())
    }
}

// ── Channel trait implementation ────────────────────────────────────

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let bot_token = self.bot_token.clone();
        let allowed_users = self.allowed_users.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let api = |method: &str| format!("https://api.telegram.org/bot{bot_token}/{method}");
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for updates...");

            loop {
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": 30,
                    "allowed_updates": ["message", "callback_query"]
                });

                let resp = match client.post(api("getUpdates")).json(&body).send().await {
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

                let Some(results) = data.get("result").and_then(serde_json::Value::as_array)
                else {
                    continue;
                };

                for update in results {
                    if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64)
                    {
                        offset = uid + 1;
                    }

                    let parsed = if let Some(cq) = update.get("callback_query") {
                        // Ack the press so the client stops its spinner.
                        if let Some(id) = cq.get("id").and_then(serde_json::Value::as_str) {
                            let _ = client
                                .post(api("answerCallbackQuery"))
                                .json(&serde_json::json!({ "callback_query_id": id }))
                                .send()
                                .await;
                        }
                        parse_callback_query(cq)
                    } else {
                        update.get("message").and_then(parse_message)
                    };

                    let Some((user_id, username, chat_id, payload)) = parsed else {
                        continue;
                    };

                    let allowed = check_user_allowed(
                        &allowed_users,
                        [username.as_str(), user_id.as_str()],
                    );
                    if !allowed {
                        tracing::warn!(
                            "Telegram: ignoring event from unauthorized user: \
                             username={username}, user_id={user_id}"
                        );
                        continue;
                    }

                    let event = InboundEvent::new("telegram", &user_id, payload).with_metadata(
                        serde_json::json!({
                            "chat_id": chat_id,
                            "username": username,
                        }),
                    );

                    if tx.send(event).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        event: &InboundEvent,
        response: Outbound,
    ) -> Result<(), ChannelError> {
        let chat_id = event
            .metadata
            .get("chat_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: "No chat_id in event metadata".into(),
            })?;

        self.send_message(chat_id, &response.text, response.keyboard.as_ref())
            .await
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

type ParsedUpdate = (String, String, String, EventPayload);

/// Pull (user_id, username, chat_id, payload) out of a `message` update.
/// Photos and documents become attachments; anything without text or an
/// attachment is dropped.
fn parse_message(message: &serde_json::Value) -> Option<ParsedUpdate> {
    let payload = if message.get("photo").is_some() {
        EventPayload::Attachment(AttachmentKind::Photo)
    } else if message.get("document").is_some() {
        EventPayload::Attachment(AttachmentKind::Document)
    } else {
        let text = message.get("text").and_then(serde_json::Value::as_str)?;
        EventPayload::Text(text.to_string())
    };

    let (user_id, username) = sender_identity(message.get("from")?);
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(serde_json::Value::as_i64)
        .map(|id| id.to_string())?;

    Some((user_id, username, chat_id, payload))
}

/// Pull the same tuple out of a `callback_query` update.
fn parse_callback_query(cq: &serde_json::Value) -> Option<ParsedUpdate> {
    let data = cq.get("data").and_then(serde_json::Value::as_str)?;
    let (user_id, username) = sender_identity(cq.get("from")?);
    let chat_id = cq
        .get("message")
        .and_then(|m| m.get("chat"))
        .and_then(|c| c.get("id"))
        .and_then(serde_json::Value::as_i64)
        .map(|id| id.to_string())?;

    Some((
        user_id,
        username,
        chat_id,
        EventPayload::Callback(data.to_string()),
    ))
}

/// Numeric id (falling back to username) plus username from a `from` blob.
fn sender_identity(from: &serde_json::Value) -> (String, String) {
    let username = from
        .get("username")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let user_id = from
        .get("id")
        .and_then(serde_json::Value::as_i64)
        .map(|id| id.to_string())
        .unwrap_or_else(|| username.clone());
    (user_id, username)
}

/// Check if any identity in the iterator matches the allowed users list.
fn check_user_allowed<'a>(
    allowed_users: &[String],
    identities: impl IntoIterator<Item = &'a str>,
) -> bool {
    let ids: Vec<&str> = identities.into_iter().collect();
    allowed_users
        .iter()
        .any(|u| u == "*" || ids.contains(&u.as_str()))
}

/// Render a keyboard as Telegram `inline_keyboard` reply markup.
fn reply_markup(keyboard: &Keyboard) -> serde_json::Value {
    let rows: Vec<Vec<serde_json::Value>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| {
                    serde_json::json!({
                        "text": b.label,
                        "callback_data": b.callback,
                    })
                })
                .collect()
        })
        .collect();
    serde_json::json!({ "inline_keyboard": rows })
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let chunk = &remaining[..max_len];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(max_len);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { max_len } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Button;

    #[test]
    fn telegram_channel_name() {
        let ch = TelegramChannel::new("fake-token".into(), vec!["*".into()]);
        assert_eq!(ch.name(), "telegram");
    }

    #[test]
    fn telegram_api_url() {
        let ch = TelegramChannel::new("123:ABC".into(), vec![]);
        assert_eq!(
            ch.api_url("getMe"),
            "https://api.telegram.org/bot123:ABC/getMe"
        );
    }

    // ── User allowlist tests ────────────────────────────────────────

    #[test]
    fn user_allowed_wildcard() {
        let ch = TelegramChannel::new("t".into(), vec!["*".into()]);
        assert!(ch.is_user_allowed("anyone"));
    }

    #[test]
    fn user_allowed_specific() {
        let ch = TelegramChannel::new("t".into(), vec!["alice".into(), "bob".into()]);
        assert!(ch.is_user_allowed("alice"));
        assert!(!ch.is_user_allowed("eve"));
    }

    #[test]
    fn user_denied_empty_list() {
        let ch = TelegramChannel::new("t".into(), vec![]);
        assert!(!ch.is_user_allowed("anyone"));
    }

    #[test]
    fn allowlist_matches_numeric_id_identity() {
        assert!(check_user_allowed(
            &["123456789".to_string()],
            ["unknown", "123456789"]
        ));
        assert!(!check_user_allowed(
            &["alice".to_string()],
            ["unknown", "123456789"]
        ));
    }

    // ── Update parsing tests ────────────────────────────────────────

    #[test]
    fn parse_text_message() {
        let message = serde_json::json!({
            "text": "80000",
            "from": {"id": 42, "username": "alice"},
            "chat": {"id": 99}
        });
        let (user_id, username, chat_id, payload) = parse_message(&message).unwrap();
        assert_eq!(user_id, "42");
        assert_eq!(username, "alice");
        assert_eq!(chat_id, "99");
        assert_eq!(payload, EventPayload::Text("80000".into()));
    }

    #[test]
    fn parse_photo_message_as_attachment() {
        let message = serde_json::json!({
            "photo": [{"file_id": "abc"}],
            "from": {"id": 42},
            "chat": {"id": 99}
        });
        let (_, _, _, payload) = parse_message(&message).unwrap();
        assert_eq!(payload, EventPayload::Attachment(AttachmentKind::Photo));
    }

    #[test]
    fn parse_document_message_as_attachment() {
        let message = serde_json::json!({
            "document": {"file_id": "abc"},
            "from": {"id": 42},
            "chat": {"id": 99}
        });
        let (_, _, _, payload) = parse_message(&message).unwrap();
        assert_eq!(payload, EventPayload::Attachment(AttachmentKind::Document));
    }

    #[test]
    fn message_without_text_or_attachment_is_dropped() {
        let message = serde_json::json!({
            "sticker": {"file_id": "abc"},
            "from": {"id": 42},
            "chat": {"id": 99}
        });
        assert!(parse_message(&message).is_none());
    }

    #[test]
    fn parse_callback_query_update() {
        let cq = serde_json::json!({
            "id": "cbq-1",
            "data": "quick_analyze",
            "from": {"id": 42, "username": "alice"},
            "message": {"chat": {"id": 99}}
        });
        let (user_id, _, chat_id, payload) = parse_callback_query(&cq).unwrap();
        assert_eq!(user_id, "42");
        assert_eq!(chat_id, "99");
        assert_eq!(payload, EventPayload::Callback("quick_analyze".into()));
    }

    #[test]
    fn callback_query_without_data_is_dropped() {
        let cq = serde_json::json!({
            "id": "cbq-1",
            "from": {"id": 42},
            "message": {"chat": {"id": 99}}
        });
        assert!(parse_callback_query(&cq).is_none());
    }

    // ── Reply markup tests ──────────────────────────────────────────

    #[test]
    fn reply_markup_shape() {
        let kb = Keyboard::from_rows(vec![
            vec![Button::new("Yes", "debt_yes"), Button::new("No", "debt_no")],
            vec![Button::new("Back to menu", "menu")],
        ]);
        let markup = reply_markup(&kb);
        assert_eq!(markup["inline_keyboard"][0][0]["text"], "Yes");
        assert_eq!(markup["inline_keyboard"][0][1]["callback_data"], "debt_no");
        assert_eq!(markup["inline_keyboard"][1][0]["callback_data"], "menu");
    }

    // ── Message splitting tests ─────────────────────────────────────

    #[test]
    fn split_message_short() {
        let chunks = split_message("Hello", 4096);
        assert_eq!(chunks, vec!["Hello"]);
    }

    #[test]
    fn split_message_exact_limit() {
        let msg = "a".repeat(4096);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 4096);
    }

    #[test]
    fn split_message_over_limit_on_newline() {
        let msg = format!("{}\n{}", "a".repeat(2000), "b".repeat(3000));
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(2000));
        assert_eq!(chunks[1], "b".repeat(3000));
    }

    #[test]
    fn split_message_no_good_split_point() {
        let msg = "a".repeat(5000);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4096);
        assert_eq!(chunks[1].len(), 904);
    }
}
