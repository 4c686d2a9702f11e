// SPDX-License-Identifier: Apache-2.0

//! Plan catalog handlers. Listing is public (the pricing page); the
//! mutations are admin-only.

use crate::auth::{require_admin, Session};
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
use tipline_api::{ApiError, ApiErrorCode, PlanPayload};
use tipline_model::{PlanDraft, PlanId, PlanType};

pub(crate) async fn list_plans_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    match state.store.list_plans().await {
        Ok(plans) => Json(plans).into_response(),
        Err(err) => internal_error(&request_id, &err),
    }
}

pub(crate) async fn create_plan_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<PlanPayload>,
) -> Response {
    if let Err(response) = require_admin(&session.0) {
        return response;
    }
    let plan_type = match PlanType::parse(&body.plan_type) {
        Ok(plan_type) => plan_type,
        Err(err) => {
            return error_response(
                ApiError::validation_failed(err.to_string()).with_request_id(&request_id.0),
            );
        }
    };
    let draft = match PlanDraft::new(
        &body.name,
        body.price,
        body.duration,
        plan_type,
        body.description.clone(),
    ) {
        Ok(draft) => draft,
        Err(err) => {
            return error_response(
                ApiError::validation_failed(err.to_string()).with_request_id(&request_id.0),
            );
        }
    };
    match state.store.create_plan(&draft, Utc::now()).await {
        Ok(plan) => (StatusCode::CREATED, Json(plan)).into_response(),
        Err(err) => internal_error(&request_id, &err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeletePlanParams {
    id: Option<String>,
}

pub(crate) async fn delete_plan_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<DeletePlanParams>,
) -> Response {
    if let Err(response) = require_admin(&session.0) {
        return response;
    }
    let Some(raw) = params.id else {
        return error_response(ApiError::missing_param("id").with_request_id(&request_id.0));
    };
    let id = match PlanId::parse(&raw) {
        Ok(id) => id,
        Err(err) => {
            return error_response(
                ApiError::validation_failed(err.to_string()).with_request_id(&request_id.0),
            );
        }
    };
    match state.store.delete_plan(id).await {
        Ok(true) => Json(json!({"success": true})).into_response(),
        Ok(false) => error_response(
            ApiError::new(
                ApiErrorCode::PlanNotFound,
                format!("plan {id} not found"),
                json!({"plan_id": id}),
                "req-unknown",
            )
            .with_request_id(&request_id.0),
        ),
        Err(err) => internal_error(&request_id, &err),
    }
}
