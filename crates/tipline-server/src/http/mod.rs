// SPDX-License-Identifier: Apache-2.0

//! Handler modules and the shared response helpers. Every failure leaves
//! the process as a `{"error": {...}}` envelope built here, so the wire
//! shape cannot drift between routes.

pub(crate) mod admin;
pub(crate) mod auth_profile;
pub(crate) mod notifications;
pub(crate) mod payments;
pub(crate) mod plans;
pub(crate) mod tips;

use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tipline_api::{map_error_status, ApiError, ApiErrorCode};
use tracing::error;

pub(crate) fn api_error_response(status: StatusCode, error: ApiError) -> Response {
    (status, Json(json!({ "error": error }))).into_response()
}

/// Envelope with the status derived from the error code.
pub(crate) fn error_response(error: ApiError) -> Response {
    let status = StatusCode::from_u16(map_error_status(&error))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    api_error_response(status, error)
}

/// Opaque 500. The cause goes to the log, never to the client.
pub(crate) fn internal_error(request_id: &RequestId, cause: &dyn std::fmt::Display) -> Response {
    error!(request_id = %request_id.0, %cause, "request failed");
    error_response(
        ApiError::new(
            ApiErrorCode::Internal,
            "internal error",
            json!({}),
            "req-unknown",
        )
        .with_request_id(&request_id.0),
    )
}

pub(crate) async fn healthz_handler() -> Response {
    Json(json!({"status": "ok"})).into_response()
}

/// Ready only when the store answers.
pub(crate) async fn readyz_handler(State(state): State<AppState>) -> Response {
    match state.store.count_users().await {
        Ok(_) => Json(json!({"status": "ready"})).into_response(),
        Err(err) => {
            error!(%err, "readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unavailable"})),
            )
                .into_response()
        }
    }
}
