use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use shared::spotify::SpotifyError;
use shared::spotify::session::complete_authorization;
use tracing::{info, warn};

use super::AppState;
use super::errors::store_error_response;
use super::tokens::hash_token;

const AUTHORIZED_TEXT: &str = "Spotify 授權成功！你現在可以回到 LINE 並使用 Spotify 功能。";
const AUTHORIZATION_FAILED_TEXT: &str = "授權失敗，請重試。";
const STATE_INVALID_TEXT: &str = "授權連結已失效，請回到 LINE 重新輸入「連接spotify」。";
const UPSTREAM_FAILED_TEXT: &str = "無法向 Spotify 取得授權，請稍後再試。";

#[derive(Debug, Deserialize)]
pub(super) struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// OAuth redirect target. The `state` token binds the authorization to the
/// LINE user who asked for the link and can be used once.
pub(super) async fn spotify_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error.as_deref() {
        warn!(error, "spotify authorization was declined");
        return (StatusCode::BAD_REQUEST, AUTHORIZATION_FAILED_TEXT).into_response();
    }

    let Some(code) = query.code.filter(|code| !code.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, AUTHORIZATION_FAILED_TEXT).into_response();
    };

    let Some(state_token) = query.state.filter(|token| !token.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, STATE_INVALID_TEXT).into_response();
    };

    let now = Utc::now().timestamp();
    let user_id = match state
        .store
        .consume_oauth_state(&hash_token(state_token.trim()), now)
        .await
    {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            warn!("spotify callback with unknown or expired state");
            return (StatusCode::BAD_REQUEST, STATE_INVALID_TEXT).into_response();
        }
        Err(err) => return store_error_response(err),
    };

    match complete_authorization(&state.store, &state.spotify_oauth, &user_id, &code, now).await {
        Ok(_) => {
            info!(user_id = %user_id, "spotify account connected");
            (StatusCode::OK, AUTHORIZED_TEXT).into_response()
        }
        Err(SpotifyError::Store(err)) => store_error_response(err),
        Err(err) => {
            warn!(user_id = %user_id, "spotify code exchange failed: {err}");
            (StatusCode::BAD_GATEWAY, UPSTREAM_FAILED_TEXT).into_response()
        }
    }
}
