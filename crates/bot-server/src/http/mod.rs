use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Router, middleware};
use shared::config::BotConfig;
use shared::intent::IntentClassifier;
use shared::line::LineClient;
use shared::llm::LlmGateway;
use shared::repos::Store;
use shared::spotify::{DEFAULT_SCOPES, SpotifyApi, SpotifyOAuth, SpotifyOAuthConfig};
use shared::weather::WeatherClient;

mod callback;
mod errors;
mod health;
mod observability;
pub(crate) mod tokens;
mod webhook;

/// Values read per request that do not belong to any one client.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub channel_secret: String,
    pub playlist_name: String,
    pub default_weather_location: String,
    pub oauth_state_ttl_seconds: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub line: LineClient,
    pub spotify_oauth: SpotifyOAuth,
    pub spotify_api: SpotifyApi,
    pub weather: WeatherClient,
    pub llm: Arc<dyn LlmGateway>,
    pub classifier: IntentClassifier,
    pub settings: BotSettings,
}

impl AppState {
    /// Wires every outbound client from config. `http_client` is shared by
    /// all non-LLM clients and should carry the configured timeout.
    pub fn from_config(
        config: &BotConfig,
        store: Store,
        http_client: reqwest::Client,
        llm: Arc<dyn LlmGateway>,
    ) -> Self {
        Self {
            store,
            line: LineClient::new(
                config.line_api_base_url.clone(),
                config.line_channel_access_token.clone(),
                http_client.clone(),
            ),
            spotify_oauth: SpotifyOAuth::new(
                SpotifyOAuthConfig {
                    client_id: config.spotify_client_id.clone(),
                    client_secret: config.spotify_client_secret.clone(),
                    redirect_uri: config.spotify_redirect_uri.clone(),
                    auth_url: config.spotify_auth_url.clone(),
                    token_url: config.spotify_token_url.clone(),
                    scopes: DEFAULT_SCOPES.iter().map(|scope| scope.to_string()).collect(),
                },
                http_client.clone(),
            ),
            spotify_api: SpotifyApi::new(config.spotify_api_base_url.clone(), http_client.clone()),
            weather: WeatherClient::new(
                config.cwa_api_base_url.clone(),
                config.cwa_api_key.clone(),
                http_client,
            ),
            classifier: IntentClassifier::new(config.intent_strategy, llm.clone()),
            llm,
            settings: BotSettings {
                channel_secret: config.line_channel_secret.clone(),
                playlist_name: config.spotify_playlist_name.clone(),
                default_weather_location: config.weather_default_location.clone(),
                oauth_state_ttl_seconds: config.oauth_state_ttl_seconds,
            },
        }
    }
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/readyz", get(health::readyz))
        .route("/webhooks/line", post(webhook::line_webhook))
        .route("/webhook", post(webhook::line_webhook))
        .route("/callback", get(callback::spotify_callback))
        .route("/spotify/callback", get(callback::spotify_callback))
        .layer(middleware::from_fn(
            observability::request_observability_middleware,
        ))
        .with_state(app_state)
}
