// SPDX-License-Identifier: Apache-2.0

//! Payment order creation and the verification endpoint.

use crate::http::{error_response, internal_error};
use crate::middleware::request_tracing::RequestId;
use crate::payments::{verify_and_grant, VerificationError};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::json;
use tipline_api::{ApiError, ApiErrorCode, CreateOrderRequest, VerifyPaymentRequest};
use tipline_model::{PlanId, UserId};
use tracing::warn;

pub(crate) async fn create_order_handler(
    State(state): State<AppState>,
    session: crate::auth::Session,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<CreateOrderRequest>,
) -> Response {
    if body.plan_id <= 0 {
        return error_response(
            ApiError::validation_failed("plan_id must be positive").with_request_id(&request_id.0),
        );
    }
    let plan_id = PlanId(body.plan_id);
    if !(body.amount > 0.0) || !body.amount.is_finite() {
        return error_response(
            ApiError::validation_failed("amount must be positive").with_request_id(&request_id.0),
        );
    }
    match state
        .payment_gateway
        .create_order(body.amount, plan_id, session.0.user_id)
        .await
    {
        Ok(order) => Json(json!({
            "id": order.order_id,
            "amount": order.amount,
            "currency": order.currency,
        }))
        .into_response(),
        Err(err) => internal_error(&request_id, &err),
    }
}

pub(crate) async fn verify_payment_handler(
    State(state): State<AppState>,
    session: crate::auth::Session,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<VerifyPaymentRequest>,
) -> Response {
    if body.plan_id <= 0 {
        return error_response(
            ApiError::validation_failed("plan_id must be positive").with_request_id(&request_id.0),
        );
    }
    let plan_id = PlanId(body.plan_id);
    let user_id: UserId = session.0.user_id;
    let outcome = verify_and_grant(
        &state.store,
        &state.api.payment_secret,
        &body.order_id,
        &body.payment_id,
        &body.signature,
        plan_id,
        user_id,
        body.amount,
        Utc::now(),
    )
    .await;
    match outcome {
        Ok(()) => Json(json!({"success": true})).into_response(),
        // Wire shape the payment client already understands; not the
        // standard envelope.
        Err(VerificationError::InvalidSignature) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Invalid signature"})),
        )
            .into_response(),
        Err(VerificationError::PlanNotFound(id)) => {
            warn!(plan_id = %id, "payment verified against unknown plan");
            error_response(
                ApiError::new(
                    ApiErrorCode::PlanNotFound,
                    format!("plan {id} not found"),
                    json!({"plan_id": id}),
                    "req-unknown",
                )
                .with_request_id(&request_id.0),
            )
        }
        Err(VerificationError::UserNotFound(_)) => {
            error_response(ApiError::not_found("user").with_request_id(&request_id.0))
        }
        Err(VerificationError::Storage(err)) => internal_error(&request_id, &err),
    }
}
