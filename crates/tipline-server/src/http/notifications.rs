// SPDX-License-Identifier: Apache-2.0

//! In-app notification handlers. Always owner-scoped: the session decides
//! whose rows are visible, there is no id in the request.

use crate::auth::Session;
use crate::http::internal_error;
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde_json::json;

pub(crate) async fn list_notifications_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    match state.store.notifications_for_user(session.0.user_id).await {
        Ok(rows) => Json(rows).into_response(),
        Err(err) => internal_error(&request_id, &err),
    }
}

/// Marks everything seen. Idempotent; repeat calls change nothing.
pub(crate) async fn mark_seen_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    match state.store.mark_all_seen(session.0.user_id).await {
        Ok(changed) => Json(json!({"success": true, "updated": changed})).into_response(),
        Err(err) => internal_error(&request_id, &err),
    }
}
