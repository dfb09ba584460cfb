use serde_json::json;
use thiserror::Error;
use tracing::warn;

use super::messages::{LineMessage, MAX_MESSAGES_PER_REPLY};

#[derive(Debug, Error)]
pub enum LineApiError {
    #[error("line api request failed: {0}")]
    Transport(String),
    #[error("line api rejected request: status={status} message={message}")]
    Rejected { status: u16, message: String },
}

#[derive(Clone)]
pub struct LineClient {
    base_url: String,
    channel_access_token: String,
    client: reqwest::Client,
}

impl LineClient {
    pub fn new(base_url: String, channel_access_token: String, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            channel_access_token,
            client,
        }
    }

    /// Sends up to [`MAX_MESSAGES_PER_REPLY`] messages; extras are dropped
    /// with a warning since the platform rejects the whole call otherwise.
    pub async fn reply(
        &self,
        reply_token: &str,
        messages: &[LineMessage],
    ) -> Result<(), LineApiError> {
        if messages.is_empty() {
            return Ok(());
        }
        if messages.len() > MAX_MESSAGES_PER_REPLY {
            warn!(
                dropped = messages.len() - MAX_MESSAGES_PER_REPLY,
                "reply exceeds message limit; dropping extra messages"
            );
        }
        let messages = &messages[..messages.len().min(MAX_MESSAGES_PER_REPLY)];

        let response = self
            .client
            .post(format!("{}/v2/bot/message/reply", self.base_url))
            .bearer_auth(&self.channel_access_token)
            .json(&json!({
                "replyToken": reply_token,
                "messages": messages,
            }))
            .send()
            .await
            .map_err(|err| LineApiError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LineApiError::Rejected {
                status: status.as_u16(),
                message: parse_error_message(&body),
            });
        }

        Ok(())
    }
}

fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string())
}
