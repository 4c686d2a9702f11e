// SPDX-License-Identifier: Apache-2.0

//! Session tokens: an HMAC-SHA256-signed claims bag. The server reads only
//! the user id and role from it; role and entitlement fields arriving in
//! request bodies are never trusted.

use crate::http::api_error_response;
use crate::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Response;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tipline_api::ApiError;
use tipline_model::{Role, UserId};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    /// Unix seconds.
    pub exp: i64,
}

impl SessionClaims {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

fn mac_for(secret: &str, payload: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(payload);
    mac
}

/// `base64url(claims-json) . base64url(hmac)`.
pub fn issue_session(
    user_id: UserId,
    email: &str,
    role: Role,
    secret: &str,
    now: DateTime<Utc>,
    ttl: std::time::Duration,
) -> String {
    let claims = SessionClaims {
        user_id,
        email: email.to_string(),
        role,
        exp: now.timestamp() + ttl.as_secs() as i64,
    };
    let payload = serde_json::to_vec(&claims).expect("claims serialize");
    let encoded = URL_SAFE_NO_PAD.encode(&payload);
    let tag = mac_for(secret, encoded.as_bytes()).finalize().into_bytes();
    format!("{encoded}.{}", URL_SAFE_NO_PAD.encode(tag))
}

/// Validates signature (constant-time) and expiry.
pub fn verify_session(token: &str, secret: &str, now: DateTime<Utc>) -> Option<SessionClaims> {
    let (encoded, tag_b64) = token.split_once('.')?;
    let tag = URL_SAFE_NO_PAD.decode(tag_b64).ok()?;
    mac_for(secret, encoded.as_bytes())
        .verify_slice(&tag)
        .ok()?;
    let payload = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    let claims: SessionClaims = serde_json::from_slice(&payload).ok()?;
    if claims.exp <= now.timestamp() {
        return None;
    }
    Some(claims)
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Required session. Rejects with the 401 error envelope.
pub struct Session(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_token(parts)
            .and_then(|token| verify_session(token, &state.api.session_secret, Utc::now()));
        match claims {
            Some(claims) => Ok(Self(claims)),
            None => Err(api_error_response(
                StatusCode::UNAUTHORIZED,
                ApiError::unauthenticated(),
            )),
        }
    }
}

/// Optional session for routes that degrade instead of rejecting.
pub struct MaybeSession(pub Option<SessionClaims>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_token(parts)
            .and_then(|token| verify_session(token, &state.api.session_secret, Utc::now()));
        Ok(Self(claims))
    }
}

/// Admin gate on top of a validated session.
pub fn require_admin(claims: &SessionClaims) -> Result<(), Response> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(api_error_response(
            StatusCode::FORBIDDEN,
            ApiError::forbidden(),
        ))
    }
}
