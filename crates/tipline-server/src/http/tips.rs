// SPDX-License-Identifier: Apache-2.0

//! Tip read and mutation handlers. Reads go through the content gate;
//! mutations are admin-only and creation triggers the notification
//! fan-out.

use crate::auth::{require_admin, Session};
use crate::fanout;
use crate::gate;
use crate::http::{error_response, internal_error};
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tipline_api::{ApiError, TipPayload, TipUpdatePayload};
use tipline_model::{PlanType, TipAction, TipDraft, TipId};
use tracing::warn;

fn draft_from_payload(payload: &TipPayload) -> Result<TipDraft, String> {
    let category = PlanType::parse(&payload.category).map_err(|e| e.to_string())?;
    let action = TipAction::parse(&payload.action).map_err(|e| e.to_string())?;
    TipDraft::new(
        category,
        &payload.stock_name,
        action,
        payload.entry_price,
        &payload.target_price,
        payload.stop_loss,
        &payload.timeframe,
        &payload.note,
        payload.is_demo,
    )
    .map_err(|e| e.to_string())
}

pub(crate) async fn list_tips_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    match gate::list_visible_tips(&state.store, session.0.user_id, session.0.role, Utc::now())
        .await
    {
        Ok((_tier, tips)) => Json(tips).into_response(),
        Err(err) => internal_error(&request_id, &err),
    }
}

pub(crate) async fn create_tip_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<TipPayload>,
) -> Response {
    if let Err(response) = require_admin(&session.0) {
        return response;
    }
    let draft = match draft_from_payload(&body) {
        Ok(draft) => draft,
        Err(reason) => {
            return error_response(
                ApiError::validation_failed(reason).with_request_id(&request_id.0),
            );
        }
    };
    let now = Utc::now();
    let tip = match state.store.create_tip(&draft, session.0.user_id, now).await {
        Ok(tip) => tip,
        Err(err) => return internal_error(&request_id, &err),
    };

    // The tip is durable; fan-out trouble is logged, not surfaced.
    if let Err(err) =
        fanout::on_tip_created(&state.store, &state.push_gateway, &state.api, &tip, now).await
    {
        warn!(tip_id = %tip.id, %err, "fan-out failed after tip creation");
    }

    (StatusCode::CREATED, Json(tip)).into_response()
}

pub(crate) async fn update_tip_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<TipUpdatePayload>,
) -> Response {
    if let Err(response) = require_admin(&session.0) {
        return response;
    }
    if body.id <= 0 {
        return error_response(
            ApiError::validation_failed("tip id must be positive").with_request_id(&request_id.0),
        );
    }
    let draft = match draft_from_payload(&body.fields) {
        Ok(draft) => draft,
        Err(reason) => {
            return error_response(
                ApiError::validation_failed(reason).with_request_id(&request_id.0),
            );
        }
    };
    match state
        .store
        .update_tip(TipId(body.id), &draft, Utc::now())
        .await
    {
        Ok(tip) => Json(tip).into_response(),
        Err(tipline_store::StoreError::NotFound(_)) => {
            error_response(ApiError::not_found("tip").with_request_id(&request_id.0))
        }
        Err(err) => internal_error(&request_id, &err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteTipParams {
    id: Option<String>,
}

pub(crate) async fn delete_tip_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<DeleteTipParams>,
) -> Response {
    if let Err(response) = require_admin(&session.0) {
        return response;
    }
    let Some(raw) = params.id else {
        return error_response(ApiError::missing_param("id").with_request_id(&request_id.0));
    };
    let id = match TipId::parse(&raw) {
        Ok(id) => id,
        Err(err) => {
            return error_response(
                ApiError::validation_failed(err.to_string()).with_request_id(&request_id.0),
            );
        }
    };
    match state.store.delete_tip(id).await {
        Ok(true) => Json(json!({"message": "Tip deleted successfully"})).into_response(),
        Ok(false) => error_response(ApiError::not_found("tip").with_request_id(&request_id.0)),
        Err(err) => internal_error(&request_id, &err),
    }
}
