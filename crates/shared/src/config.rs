use thiserror::Error;

use crate::config_env::{
    optional_trimmed_env, parse_bool_env, parse_http_url_env, parse_u64_env, parse_usize_env,
    require_env,
};
use crate::intent::IntentStrategy;

const DEFAULT_PORT: &str = "8080";
const DEFAULT_LINE_API_BASE_URL: &str = "https://api.line.me";
const DEFAULT_SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_SPOTIFY_PLAYLIST_NAME: &str = "LINE Jukebox";
const DEFAULT_CWA_API_BASE_URL: &str = "https://opendata.cwa.gov.tw/api/v1/rest/datastore";
const DEFAULT_WEATHER_LOCATION: &str = "臺北市";
const DEFAULT_REDIS_KEY_PREFIX: &str = "linebot";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(String),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid boolean in env var {0}")]
    ParseBool(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Firebase {
        base_url: String,
        auth: Option<String>,
    },
    Redis {
        url: String,
        key_prefix: String,
    },
    Memory,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bind_addr: String,
    pub line_channel_secret: String,
    pub line_channel_access_token: String,
    pub line_api_base_url: String,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_redirect_uri: String,
    pub spotify_auth_url: String,
    pub spotify_token_url: String,
    pub spotify_api_base_url: String,
    pub spotify_playlist_name: String,
    pub store_backend: StoreBackend,
    pub cwa_api_key: String,
    pub cwa_api_base_url: String,
    pub weather_default_location: String,
    pub http_timeout_ms: u64,
    pub oauth_state_ttl_seconds: u64,
    pub conversation_max_turns: usize,
    pub listening_history_max: usize,
    pub intent_strategy: IntentStrategy,
    pub seed_default_tracks: bool,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = optional_trimmed_env("BIND_ADDR").unwrap_or_else(|| {
            let port = optional_trimmed_env("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
            format!("0.0.0.0:{port}")
        });

        let intent_strategy = optional_trimmed_env("INTENT_CLASSIFIER")
            .unwrap_or_else(|| "keyword".to_string())
            .parse::<IntentStrategy>()
            .map_err(ConfigError::InvalidConfiguration)?;

        Ok(Self {
            bind_addr,
            line_channel_secret: require_env("LINE_CHANNEL_SECRET")?,
            line_channel_access_token: require_env("LINE_CHANNEL_ACCESS_TOKEN")?,
            line_api_base_url: parse_http_url_env("LINE_API_BASE_URL", DEFAULT_LINE_API_BASE_URL)?,
            spotify_client_id: require_env("SPOTIFY_CLIENT_ID")?,
            spotify_client_secret: require_env("SPOTIFY_CLIENT_SECRET")?,
            spotify_redirect_uri: require_env("SPOTIFY_REDIRECT_URI")?,
            spotify_auth_url: parse_http_url_env("SPOTIFY_AUTH_URL", DEFAULT_SPOTIFY_AUTH_URL)?,
            spotify_token_url: parse_http_url_env("SPOTIFY_TOKEN_URL", DEFAULT_SPOTIFY_TOKEN_URL)?,
            spotify_api_base_url: parse_http_url_env(
                "SPOTIFY_API_BASE_URL",
                DEFAULT_SPOTIFY_API_BASE_URL,
            )?,
            spotify_playlist_name: optional_trimmed_env("SPOTIFY_PLAYLIST_NAME")
                .unwrap_or_else(|| DEFAULT_SPOTIFY_PLAYLIST_NAME.to_string()),
            store_backend: parse_store_backend()?,
            cwa_api_key: require_env("CWA_API_KEY")?,
            cwa_api_base_url: parse_http_url_env("CWA_API_BASE_URL", DEFAULT_CWA_API_BASE_URL)?,
            weather_default_location: optional_trimmed_env("WEATHER_DEFAULT_LOCATION")
                .unwrap_or_else(|| DEFAULT_WEATHER_LOCATION.to_string()),
            http_timeout_ms: parse_u64_env("HTTP_TIMEOUT_MS", 10_000)?,
            oauth_state_ttl_seconds: parse_u64_env("OAUTH_STATE_TTL_SECONDS", 600)?,
            conversation_max_turns: parse_usize_env("CONVERSATION_MAX_TURNS", 40)?,
            listening_history_max: parse_usize_env("LISTENING_HISTORY_MAX", 20)?,
            intent_strategy,
            seed_default_tracks: parse_bool_env("SEED_DEFAULT_TRACKS", true)?,
        })
    }
}

/// Loads `.env` when present. A missing file is not an error.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::InvalidConfiguration(format!(
            "failed to load .env file: {err}"
        ))),
    }
}

fn parse_store_backend() -> Result<StoreBackend, ConfigError> {
    let backend = optional_trimmed_env("STORE_BACKEND")
        .unwrap_or_else(|| "firebase".to_string())
        .to_ascii_lowercase();

    match backend.as_str() {
        "firebase" => {
            let base_url = require_env("FIREBASE_URL")?;
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(ConfigError::InvalidConfiguration(
                    "FIREBASE_URL must start with http:// or https://".to_string(),
                ));
            }

            Ok(StoreBackend::Firebase {
                base_url: base_url.trim_end_matches('/').to_string(),
                auth: optional_trimmed_env("FIREBASE_AUTH"),
            })
        }
        "redis" => Ok(StoreBackend::Redis {
            url: require_env("REDIS_URL")?,
            key_prefix: optional_trimmed_env("REDIS_KEY_PREFIX")
                .unwrap_or_else(|| DEFAULT_REDIS_KEY_PREFIX.to_string()),
        }),
        "memory" => Ok(StoreBackend::Memory),
        other => Err(ConfigError::InvalidConfiguration(format!(
            "STORE_BACKEND must be one of firebase, redis, memory (got '{other}')"
        ))),
    }
}
