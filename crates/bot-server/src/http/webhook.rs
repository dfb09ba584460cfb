use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use shared::line::{LINE_SIGNATURE_HEADER, WebhookPayload, verify_signature};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::AppState;
use super::errors::bad_request_response;
use crate::dispatch;

/// Verifies the platform signature over the raw body before anything else is
/// read. Each event runs as its own task so one failing event does not hold
/// back or abort the rest of the batch.
pub(super) async fn line_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(LINE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if !verify_signature(&state.settings.channel_secret, &body, signature) {
        warn!("rejected webhook with invalid signature");
        return bad_request_response("invalid_signature", "Signature verification failed");
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!("rejected malformed webhook payload: {err}");
            return bad_request_response(
                "invalid_payload",
                "Webhook body is not a valid event batch",
            );
        }
    };

    info!(event_count = payload.events.len(), "received webhook batch");

    let mut tasks = JoinSet::new();
    for raw_event in payload.events {
        let state = state.clone();
        tasks.spawn(async move { dispatch::handle_raw_event(&state, raw_event).await });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            error!("webhook event task failed: {err}");
        }
    }

    (StatusCode::OK, "OK").into_response()
}
