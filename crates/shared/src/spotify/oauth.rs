use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::models::SpotifyTokenRecord;

use super::SpotifyError;

pub const DEFAULT_SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "playlist-read-private",
    "playlist-modify-private",
    "playlist-modify-public",
];

#[derive(Debug, Clone)]
pub struct SpotifyOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenGrant {
    /// Converts the relative expiry into an absolute timestamp. A refresh
    /// grant may omit the refresh token, in which case the previous one is
    /// carried over.
    pub fn into_record(
        self,
        now_unix: i64,
        previous_refresh_token: Option<String>,
    ) -> SpotifyTokenRecord {
        SpotifyTokenRecord {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh_token),
            expires_at: Some(now_unix.saturating_add(self.expires_in.max(0))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: Option<String>,
}

#[derive(Clone)]
pub struct SpotifyOAuth {
    config: SpotifyOAuthConfig,
    client: reqwest::Client,
}

impl SpotifyOAuth {
    pub fn new(config: SpotifyOAuthConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn authorize_url(&self, state_token: &str) -> Result<String, url::ParseError> {
        let mut url = Url::parse(&self.config.auth_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state_token);

        Ok(url.to_string())
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, SpotifyError> {
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.config.redirect_uri),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
        ])
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, SpotifyError> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
        ])
        .await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenGrant, SpotifyError> {
        let response = self
            .client
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await
            .map_err(|err| SpotifyError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = serde_json::from_str::<OAuthErrorBody>(&body)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| "unknown".to_string());
            warn!(status = status.as_u16(), error = %error, "spotify token request failed");
            return Err(SpotifyError::OAuth {
                status: status.as_u16(),
                error,
            });
        }

        response
            .json::<TokenGrant>()
            .await
            .map_err(|err| SpotifyError::InvalidResponse(err.to_string()))
    }
}
