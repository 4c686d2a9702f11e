// SPDX-License-Identifier: Apache-2.0

//! Sign-in, profile, and OTP handlers.

use crate::auth::{issue_session, MaybeSession, Session};
use crate::gateways::normalize_phone;
use crate::http::{error_response, internal_error};
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::json;
use tipline_api::{
    ApiError, ApiErrorCode, OtpSendRequest, OtpVerifyRequest, ProfileUpdateRequest,
    PushTokenRequest, SigninRequest, SigninResponse, UserView,
};
use tipline_model::{validate_email, LoginHistoryEntry, Role};
use tracing::warn;

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Identity-provider callback. The admin role is assigned here and only
/// here, by configured email; nothing in the body can request it.
pub(crate) async fn signin_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Json(body): Json<SigninRequest>,
) -> Response {
    let email = match validate_email(&body.email) {
        Ok(email) => email,
        Err(err) => {
            return error_response(
                ApiError::validation_failed(err.to_string()).with_request_id(&request_id.0),
            );
        }
    };
    let role = if email == state.api.admin_email {
        Role::Admin
    } else {
        Role::User
    };
    let now = Utc::now();
    let user = match state
        .store
        .upsert_user_on_signin(&email, body.name.as_deref(), body.image.as_deref(), role, now)
        .await
    {
        Ok(user) => user,
        Err(err) => return internal_error(&request_id, &err),
    };

    // Best effort; a full audit table must never block sign-in.
    let entry = LoginHistoryEntry {
        user_id: user.id,
        login_at: now,
        ip_address: client_ip(&headers),
        user_agent: user_agent(&headers),
        success: true,
    };
    if let Err(err) = state.store.record_login(&entry).await {
        warn!(user_id = %user.id, %err, "failed to record login");
    }

    let token = issue_session(
        user.id,
        &user.email,
        user.role,
        &state.api.session_secret,
        now,
        state.api.session_ttl,
    );
    Json(SigninResponse {
        token,
        user: UserView::from(user),
    })
    .into_response()
}

/// Tells the client whether to prompt for profile completion. Without a
/// session there is nothing to prompt for, so the answer is "complete".
pub(crate) async fn profile_check_handler(
    State(state): State<AppState>,
    MaybeSession(claims): MaybeSession,
) -> Response {
    let Some(claims) = claims else {
        return Json(json!({"profile_completed": true})).into_response();
    };
    let completed = match state.store.user_by_id(claims.user_id).await {
        Ok(Some(user)) => user.profile_completed,
        Ok(None) => true,
        Err(err) => {
            warn!(user_id = %claims.user_id, %err, "profile check failed");
            true
        }
    };
    Json(json!({"profile_completed": completed})).into_response()
}

pub(crate) async fn profile_update_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<ProfileUpdateRequest>,
) -> Response {
    let phone = body
        .phone
        .as_deref()
        .map(|p| normalize_phone(p, &state.api.phone_country_prefix));
    match state
        .store
        .update_profile(
            session.0.user_id,
            body.location.as_deref(),
            body.age,
            phone.as_deref(),
            Utc::now(),
        )
        .await
    {
        Ok(user) => {
            Json(json!({"success": true, "user": UserView::from(user)})).into_response()
        }
        Err(tipline_store::StoreError::NotFound(_)) => {
            error_response(ApiError::not_found("user").with_request_id(&request_id.0))
        }
        Err(err) => internal_error(&request_id, &err),
    }
}

pub(crate) async fn push_token_handler(
    State(state): State<AppState>,
    session: Session,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<PushTokenRequest>,
) -> Response {
    if body.push_token.trim().is_empty() {
        return error_response(
            ApiError::missing_param("push_token").with_request_id(&request_id.0),
        );
    }
    match state
        .store
        .set_push_token(session.0.user_id, body.push_token.trim(), Utc::now())
        .await
    {
        Ok(()) => Json(json!({"success": true})).into_response(),
        Err(tipline_store::StoreError::NotFound(_)) => {
            error_response(ApiError::not_found("user").with_request_id(&request_id.0))
        }
        Err(err) => internal_error(&request_id, &err),
    }
}

pub(crate) async fn otp_send_handler(
    State(state): State<AppState>,
    _session: Session,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<OtpSendRequest>,
) -> Response {
    if body.phone.trim().is_empty() {
        return error_response(ApiError::missing_param("phone").with_request_id(&request_id.0));
    }
    let phone = normalize_phone(&body.phone, &state.api.phone_country_prefix);
    match state.otp_verifier.send_code(&phone).await {
        Ok(sid) => Json(json!({"success": true, "sid": sid})).into_response(),
        Err(err) => {
            warn!(%err, "otp send failed upstream");
            error_response(
                ApiError::new(
                    ApiErrorCode::UpstreamUnavailable,
                    "verification service unavailable",
                    json!({}),
                    "req-unknown",
                )
                .with_request_id(&request_id.0),
            )
        }
    }
}

pub(crate) async fn otp_verify_handler(
    State(state): State<AppState>,
    _session: Session,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<OtpVerifyRequest>,
) -> Response {
    if body.phone.trim().is_empty() || body.code.trim().is_empty() {
        return error_response(ApiError::missing_param("phone").with_request_id(&request_id.0));
    }
    let phone = normalize_phone(&body.phone, &state.api.phone_country_prefix);
    match state.otp_verifier.check_code(&phone, body.code.trim()).await {
        Ok(true) => Json(json!({"success": true})).into_response(),
        Ok(false) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": "Invalid OTP"})),
        )
            .into_response(),
        Err(err) => {
            warn!(%err, "otp check failed upstream");
            error_response(
                ApiError::new(
                    ApiErrorCode::UpstreamUnavailable,
                    "verification service unavailable",
                    json!({}),
                    "req-unknown",
                )
                .with_request_id(&request_id.0),
            )
        }
    }
}
