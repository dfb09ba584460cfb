use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw webhook body. Events stay untyped here so one malformed event does not
/// reject the whole batch; see [`WebhookEvent::parse`].
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "lowercase",
    rename_all_fields = "camelCase"
)]
pub enum WebhookEvent {
    Message {
        reply_token: String,
        source: EventSource,
        message: EventMessage,
    },
    Postback {
        reply_token: String,
        source: EventSource,
        postback: PostbackContent,
    },
    Follow {
        reply_token: String,
        source: EventSource,
    },
    Unfollow {
        source: EventSource,
    },
    #[serde(other)]
    Unsupported,
}

impl WebhookEvent {
    pub fn parse(raw: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(raw)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::Postback { .. } => "postback",
            Self::Follow { .. } => "follow",
            Self::Unfollow { .. } => "unfollow",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn source(&self) -> Option<&EventSource> {
        match self {
            Self::Message { source, .. }
            | Self::Postback { source, .. }
            | Self::Follow { source, .. }
            | Self::Unfollow { source } => Some(source),
            Self::Unsupported => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
}

impl EventSource {
    /// Key for per-chat state: the group or room when the bot is in one,
    /// otherwise the user.
    pub fn conversation_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.room_id.as_deref())
            .or(self.user_id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventMessage {
    Text {
        #[serde(default)]
        id: Option<String>,
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostbackContent {
    pub data: String,
}

/// Payload carried in postback button `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostbackCommand {
    AddTrack { track: String },
    SearchMore { terms: String, skip: u32, limit: u32 },
}

impl PostbackCommand {
    pub fn parse(data: &str) -> Option<Self> {
        serde_json::from_str(data).ok()
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
