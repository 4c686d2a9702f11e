// SPDX-License-Identifier: Apache-2.0

//! Admin reporting handlers.

use crate::auth::{require_admin, Session};
use crate::http::internal_error;
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::json;

pub(crate) async fn stats_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    if let Err(response) = require_admin(&session.0) {
        return response;
    }
    let now = Utc::now();
    let users = match state.store.count_users().await {
        Ok(n) => n,
        Err(err) => return internal_error(&request_id, &err),
    };
    let active_subscribers = match state.store.count_active_subscribers(now).await {
        Ok(n) => n,
        Err(err) => return internal_error(&request_id, &err),
    };
    let revenue = match state.store.total_revenue().await {
        Ok(n) => n,
        Err(err) => return internal_error(&request_id, &err),
    };
    let (tips, demo_tips) = match state.store.count_tips().await {
        Ok(pair) => pair,
        Err(err) => return internal_error(&request_id, &err),
    };
    let logins = match state.store.count_logins().await {
        Ok(n) => n,
        Err(err) => return internal_error(&request_id, &err),
    };
    Json(json!({
        "users": users,
        "active_subscribers": active_subscribers,
        "revenue": revenue,
        "tips": tips,
        "demo_tips": demo_tips,
        "logins": logins,
    }))
    .into_response()
}

pub(crate) async fn subscribers_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    if let Err(response) = require_admin(&session.0) {
        return response;
    }
    match state.store.active_subscribers(Utc::now()).await {
        Ok(rows) => Json(rows).into_response(),
        Err(err) => internal_error(&request_id, &err),
    }
}

pub(crate) async fn login_history_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    if let Err(response) = require_admin(&session.0) {
        return response;
    }
    match state
        .store
        .login_history(state.api.login_history_limit)
        .await
    {
        Ok(rows) => Json(rows).into_response(),
        Err(err) => internal_error(&request_id, &err),
    }
}
