#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::sync::Mutex;

pub const SEARCH_TOTAL: u32 = 25;
pub const RECOMMENDED_TRACK_ID: &str = "rec-1";
pub const CREATED_PLAYLIST_ID: &str = "playlist-1";
pub const EARTHQUAKE_IMAGE_URL: &str = "https://scweb.cwa.gov.tw/report.png";

#[derive(Debug, Clone)]
pub struct ApiCall {
    pub method: &'static str,
    pub path: String,
    pub bearer: String,
}

/// Everything the bot sent to the fake LINE, Spotify and CWA endpoints.
#[derive(Clone, Default)]
pub struct UpstreamRecorder {
    replies: Arc<Mutex<Vec<Value>>>,
    token_forms: Arc<Mutex<Vec<HashMap<String, String>>>>,
    api_calls: Arc<Mutex<Vec<ApiCall>>>,
    cwa_queries: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
    deleted_playlists: Arc<Mutex<HashSet<String>>>,
    spotify_api_down: Arc<AtomicBool>,
}

impl UpstreamRecorder {
    pub async fn replies(&self) -> Vec<Value> {
        self.replies.lock().await.clone()
    }

    /// Text of every text message across all replies, in arrival order.
    pub async fn reply_texts(&self) -> Vec<String> {
        self.replies
            .lock()
            .await
            .iter()
            .flat_map(|reply| {
                reply["messages"]
                    .as_array()
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
            })
            .filter_map(|message| message["text"].as_str().map(str::to_string))
            .collect()
    }

    pub async fn reply_for(&self, reply_token: &str) -> Option<Value> {
        self.replies
            .lock()
            .await
            .iter()
            .find(|reply| reply["replyToken"] == reply_token)
            .cloned()
    }

    pub async fn token_forms(&self) -> Vec<HashMap<String, String>> {
        self.token_forms.lock().await.clone()
    }

    pub async fn refresh_count(&self) -> usize {
        self.token_forms
            .lock()
            .await
            .iter()
            .filter(|form| form.get("grant_type").map(String::as_str) == Some("refresh_token"))
            .count()
    }

    pub async fn api_calls(&self) -> Vec<ApiCall> {
        self.api_calls.lock().await.clone()
    }

    /// Dataset id and query string of every CWA request.
    pub async fn cwa_queries(&self) -> Vec<(String, HashMap<String, String>)> {
        self.cwa_queries.lock().await.clone()
    }

    pub fn set_spotify_api_down(&self, down: bool) {
        self.spotify_api_down.store(down, Ordering::SeqCst);
    }

    /// Adding tracks to this playlist answers 404 from now on.
    pub async fn delete_playlist(&self, playlist_id: &str) {
        self.deleted_playlists
            .lock()
            .await
            .insert(playlist_id.to_string());
    }

    async fn record_call(&self, method: &'static str, path: String, headers: &HeaderMap) -> bool {
        let bearer = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .unwrap_or_default()
            .to_string();
        self.api_calls.lock().await.push(ApiCall {
            method,
            path,
            bearer,
        });

        !self.spotify_api_down.load(Ordering::SeqCst)
    }
}

/// One local server standing in for LINE (`/line`), Spotify (`/spotify`) and
/// the CWA open data API (`/cwa`).
pub struct MockUpstreams {
    pub base_url: String,
    pub recorder: UpstreamRecorder,
    handle: tokio::task::JoinHandle<()>,
}

impl MockUpstreams {
    pub async fn start() -> Self {
        let recorder = UpstreamRecorder::default();
        let app = Router::new()
            .route("/line/v2/bot/message/reply", post(line_reply))
            .route("/spotify/token", post(spotify_token))
            .route("/spotify/v1/recommendations", get(recommendations))
            .route("/spotify/v1/search", get(search))
            .route("/spotify/v1/tracks/{track_id}", get(track))
            .route("/spotify/v1/me", get(current_user))
            .route("/spotify/v1/me/playlists", get(my_playlists))
            .route("/spotify/v1/users/{user_id}/playlists", post(create_playlist))
            .route("/spotify/v1/playlists/{playlist_id}/tracks", post(add_tracks))
            .route("/cwa/{dataset}", get(cwa_dataset))
            .with_state(recorder.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("mock upstream listener should bind");
        let bind_addr = listener
            .local_addr()
            .expect("mock upstream listener local address should exist");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("mock upstream server should run");
        });

        Self {
            base_url: format!("http://{bind_addr}"),
            recorder,
            handle,
        }
    }

    pub fn line_api_base_url(&self) -> String {
        format!("{}/line", self.base_url)
    }

    pub fn spotify_token_url(&self) -> String {
        format!("{}/spotify/token", self.base_url)
    }

    pub fn spotify_api_base_url(&self) -> String {
        format!("{}/spotify/v1", self.base_url)
    }
}

impl Drop for MockUpstreams {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn track_json(id: &str, name: &str, popularity: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "popularity": popularity,
        "artists": [{ "name": "Mock Artist" }],
        "album": { "images": [{ "url": format!("https://img.test/{id}.jpg"), "width": 640 }] },
        "external_urls": { "spotify": format!("https://open.spotify.com/track/{id}") }
    })
}

fn unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": { "status": 503, "message": "service unavailable" } })),
    )
        .into_response()
}

async fn line_reply(
    State(recorder): State<UpstreamRecorder>,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorder.replies.lock().await.push(body);
    Json(json!({}))
}

async fn spotify_token(
    State(recorder): State<UpstreamRecorder>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    recorder.token_forms.lock().await.push(form.clone());

    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") if form.get("code").map(String::as_str) == Some("bad-code") => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        )
            .into_response(),
        Some("authorization_code") => Json(json!({
            "access_token": "access-from-code",
            "refresh_token": "refresh-from-code",
            "expires_in": 3600,
            "token_type": "Bearer"
        }))
        .into_response(),
        Some("refresh_token") => Json(json!({
            "access_token": "access-refreshed",
            "expires_in": 3600,
            "token_type": "Bearer"
        }))
        .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unsupported_grant_type" })),
        )
            .into_response(),
    }
}

async fn recommendations(State(recorder): State<UpstreamRecorder>, headers: HeaderMap) -> Response {
    if !recorder
        .record_call("GET", "/recommendations".to_string(), &headers)
        .await
    {
        return unavailable();
    }

    Json(json!({ "tracks": [track_json(RECOMMENDED_TRACK_ID, "Recommended Song", 70)] }))
        .into_response()
}

async fn search(
    State(recorder): State<UpstreamRecorder>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !recorder.record_call("GET", "/search".to_string(), &headers).await {
        return unavailable();
    }

    let offset = query
        .get("offset")
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(0);
    let limit = query
        .get("limit")
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(10);

    Json(json!({
        "tracks": {
            "items": [
                track_json("s1", "Quiet Song", 40),
                track_json("s2", "Loud Song", 90)
            ],
            "total": SEARCH_TOTAL,
            "offset": offset,
            "limit": limit
        }
    }))
    .into_response()
}

async fn track(
    State(recorder): State<UpstreamRecorder>,
    headers: HeaderMap,
    Path(track_id): Path<String>,
) -> Response {
    if !recorder
        .record_call("GET", format!("/tracks/{track_id}"), &headers)
        .await
    {
        return unavailable();
    }
    if track_id.starts_with("missing") {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "status": 404, "message": "Non existing id" } })),
        )
            .into_response();
    }

    Json(track_json(&track_id, &format!("Track {track_id}"), 50)).into_response()
}

async fn current_user(State(recorder): State<UpstreamRecorder>, headers: HeaderMap) -> Response {
    if !recorder.record_call("GET", "/me".to_string(), &headers).await {
        return unavailable();
    }

    Json(json!({ "id": "spotify-user" })).into_response()
}

async fn my_playlists(State(recorder): State<UpstreamRecorder>, headers: HeaderMap) -> Response {
    if !recorder
        .record_call("GET", "/me/playlists".to_string(), &headers)
        .await
    {
        return unavailable();
    }

    Json(json!({ "items": [], "total": 0 })).into_response()
}

async fn create_playlist(
    State(recorder): State<UpstreamRecorder>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    if !recorder
        .record_call("POST", format!("/users/{user_id}/playlists"), &headers)
        .await
    {
        return unavailable();
    }

    (StatusCode::CREATED, Json(json!({ "id": CREATED_PLAYLIST_ID }))).into_response()
}

async fn add_tracks(
    State(recorder): State<UpstreamRecorder>,
    headers: HeaderMap,
    Path(playlist_id): Path<String>,
) -> Response {
    if !recorder
        .record_call("POST", format!("/playlists/{playlist_id}/tracks"), &headers)
        .await
    {
        return unavailable();
    }
    if recorder.deleted_playlists.lock().await.contains(&playlist_id) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "status": 404, "message": "Not found." } })),
        )
            .into_response();
    }

    (StatusCode::CREATED, Json(json!({ "snapshot_id": "snapshot-1" }))).into_response()
}

/// Knows one county (臺北市) and one earthquake report. Any other location
/// gets an empty location list, which is how the real API answers.
async fn cwa_dataset(
    State(recorder): State<UpstreamRecorder>,
    Path(dataset): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    recorder
        .cwa_queries
        .lock()
        .await
        .push((dataset.clone(), query.clone()));

    if query.get("Authorization").map(String::as_str) != Some("cwa-key") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Unauthorized" })),
        )
            .into_response();
    }

    match dataset.as_str() {
        "F-C0032-001" => {
            let locations = match query.get("locationName").map(String::as_str) {
                Some("臺北市") => vec![taipei_forecast()],
                _ => Vec::new(),
            };
            Json(json!({ "success": "true", "records": { "location": locations } }))
                .into_response()
        }
        "E-A0016-001" => Json(json!({
            "success": "true",
            "records": {
                "Earthquake": [{
                    "EarthquakeNo": 115000,
                    "ReportContent": "花蓮縣近海發生規模4.2有感地震",
                    "ReportImageURI": EARTHQUAKE_IMAGE_URL,
                    "Web": "https://scweb.cwa.gov.tw/",
                    "EarthquakeInfo": {
                        "OriginTime": "2026-10-19 08:12:30",
                        "FocalDepth": 15.3,
                        "Epicenter": { "Location": "花蓮縣政府東南東方 25.1 公里" },
                        "EarthquakeMagnitude": { "MagnitudeValue": 4.2 }
                    }
                }]
            }
        }))
        .into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "unknown dataset" })),
        )
            .into_response(),
    }
}

fn taipei_forecast() -> Value {
    let period = |value: &str| {
        json!({
            "startTime": "2026-10-19 18:00:00",
            "endTime": "2026-10-20 06:00:00",
            "parameter": { "parameterName": value }
        })
    };

    json!({
        "locationName": "臺北市",
        "weatherElement": [
            { "elementName": "Wx", "time": [period("多雲時晴")] },
            { "elementName": "PoP", "time": [period("20")] },
            { "elementName": "MinT", "time": [period("22")] },
            { "elementName": "MaxT", "time": [period("28")] },
            { "elementName": "CI", "time": [period("舒適至悶熱")] }
        ]
    })
}
