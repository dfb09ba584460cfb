#![allow(dead_code)]

pub mod fake_llm;
pub mod upstream_mock;

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use bot_server::http::{AppState, build_router};
use serde_json::{Value, json};
use shared::config::{BotConfig, StoreBackend};
use shared::intent::IntentStrategy;
use shared::line::{LINE_SIGNATURE_HEADER, sign_body};
use shared::repos::{MemoryStore, Store, StoreLimits};
use tower::ServiceExt;

use fake_llm::FakeLlm;
use upstream_mock::MockUpstreams;

pub const CHANNEL_SECRET: &str = "integration-channel-secret";
pub const USER_ID: &str = "U0123456789abcdef";

/// Router wired to local mock upstreams and an in-memory store.
pub struct TestBot {
    pub app: Router,
    pub store: Store,
    pub documents: MemoryStore,
    pub llm: FakeLlm,
    pub upstreams: MockUpstreams,
}

impl TestBot {
    pub async fn start(llm: FakeLlm) -> Self {
        let upstreams = MockUpstreams::start().await;
        let config = test_config(&upstreams);
        let documents = MemoryStore::default();
        let store = Store::new(
            Arc::new(documents.clone()),
            StoreLimits {
                conversation_max_turns: config.conversation_max_turns,
                listening_history_max: config.listening_history_max,
            },
        );
        store
            .seed_default_tracks()
            .await
            .expect("seeding default tracks should succeed");

        let state = AppState::from_config(
            &config,
            store.clone(),
            reqwest::Client::new(),
            Arc::new(llm.clone()),
        );

        Self {
            app: build_router(state),
            store,
            documents,
            llm,
            upstreams,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");

        (status, String::from_utf8_lossy(&body).into_owned())
    }

    pub async fn post_events(&self, events: Vec<Value>) -> (StatusCode, String) {
        self.send(signed_webhook(&json!({ "destination": "Ubot", "events": events })))
            .await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.send(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
    }
}

pub fn test_config(upstreams: &MockUpstreams) -> BotConfig {
    BotConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        line_channel_secret: CHANNEL_SECRET.to_string(),
        line_channel_access_token: "line-access-token".to_string(),
        line_api_base_url: upstreams.line_api_base_url(),
        spotify_client_id: "spotify-client".to_string(),
        spotify_client_secret: "spotify-secret".to_string(),
        spotify_redirect_uri: "https://bot.test/callback".to_string(),
        spotify_auth_url: "https://accounts.test/authorize".to_string(),
        spotify_token_url: upstreams.spotify_token_url(),
        spotify_api_base_url: upstreams.spotify_api_base_url(),
        spotify_playlist_name: "LINE Jukebox".to_string(),
        store_backend: StoreBackend::Memory,
        cwa_api_key: "cwa-key".to_string(),
        cwa_api_base_url: format!("{}/cwa", upstreams.base_url),
        weather_default_location: "臺北市".to_string(),
        http_timeout_ms: 5_000,
        oauth_state_ttl_seconds: 600,
        conversation_max_turns: 6,
        listening_history_max: 20,
        intent_strategy: IntentStrategy::Keyword,
        seed_default_tracks: true,
    }
}

pub fn signed_webhook(payload: &Value) -> Request<Body> {
    let body = serde_json::to_vec(payload).expect("payload should serialize");
    let signature = sign_body(CHANNEL_SECRET, &body);
    webhook_request(body, &signature)
}

pub fn webhook_request(body: Vec<u8>, signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhooks/line")
        .header("content-type", "application/json")
        .header(LINE_SIGNATURE_HEADER, signature)
        .body(Body::from(body))
        .expect("request should build")
}

pub fn text_event(reply_token: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": reply_token,
        "timestamp": 1_700_000_000_000_i64,
        "mode": "active",
        "source": { "type": "user", "userId": USER_ID },
        "message": { "type": "text", "id": "m1", "text": text }
    })
}

pub fn group_text_event(reply_token: &str, group_id: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": reply_token,
        "source": { "type": "group", "groupId": group_id, "userId": USER_ID },
        "message": { "type": "text", "id": "m2", "text": text }
    })
}

pub fn postback_event(reply_token: &str, data: &str) -> Value {
    json!({
        "type": "postback",
        "replyToken": reply_token,
        "source": { "type": "user", "userId": USER_ID },
        "postback": { "data": data }
    })
}

/// Reads the `state` query parameter out of an authorize link embedded in
/// reply text.
pub fn state_from_connect_reply(text: &str) -> String {
    let start = text.find("state=").expect("reply should carry a state") + "state=".len();
    text[start..]
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-')
        .collect()
}
