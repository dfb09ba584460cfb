use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::models::{ErrorBody, ErrorResponse};
use shared::repos::StoreError;
use tracing::error;

pub(super) fn bad_request_response(code: &str, message: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, code, message)
}

pub(super) fn store_error_response(err: StoreError) -> Response {
    match err {
        StoreError::InvalidPath(_) => {
            bad_request_response("invalid_identifier", "Identifier is invalid")
        }
        other => {
            error!("document store operation failed: {other}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Unexpected server error",
            )
        }
    }
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
            },
        }),
    )
        .into_response()
}
