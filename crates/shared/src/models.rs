use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Model,
}

impl ConversationRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: ConversationRole,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackReference {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub url: String,
}

/// Spotify credentials cached per LINE user. `expires_at` is unix seconds;
/// records written by older revisions may lack it and count as expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotifyTokenRecord {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl SpotifyTokenRecord {
    pub fn is_expired(&self, now_unix: i64, skew_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now_unix.saturating_add(skew_seconds),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthStateRecord {
    pub user_id: String,
    pub expires_at: i64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ConversationTurn, SpotifyTokenRecord};

    #[test]
    fn token_record_without_expiry_is_expired() {
        let record: SpotifyTokenRecord = serde_json::from_value(json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600
        }))
        .expect("legacy record should parse");

        assert!(record.is_expired(0, 0));
    }

    #[test]
    fn token_record_respects_skew() {
        let record = SpotifyTokenRecord {
            access_token: "at".to_string(),
            refresh_token: None,
            expires_at: Some(1_000),
        };

        assert!(!record.is_expired(900, 30));
        assert!(record.is_expired(980, 30));
        assert!(record.is_expired(1_000, 0));
    }

    #[test]
    fn conversation_turn_uses_lowercase_roles() {
        let value = serde_json::to_value(ConversationTurn::model("hi")).expect("serializes");
        assert_eq!(value, json!({"role": "model", "text": "hi"}));
    }
}
