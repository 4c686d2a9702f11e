// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The full failure taxonomy the trust boundary can surface. Anything the
/// store or an upstream reports that is not one of these collapses to
/// `Internal` with no detail leaked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiErrorCode {
    Unauthenticated,
    Forbidden,
    NotFound,
    PlanNotFound,
    InvalidSignature,
    ValidationFailed,
    MissingParameter,
    UpstreamUnavailable,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
    pub request_id: String,
}

impl ApiError {
    #[must_use]
    pub fn new(
        code: ApiErrorCode,
        message: impl Into<String>,
        details: Value,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            request_id: request_id.into(),
        }
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::new(
            ApiErrorCode::Unauthenticated,
            "not authenticated",
            json!({}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(
            ApiErrorCode::Forbidden,
            "not authorized",
            json!({}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn not_found(entity: &str) -> Self {
        Self::new(
            ApiErrorCode::NotFound,
            format!("{entity} not found"),
            json!({"entity": entity}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn missing_param(name: &str) -> Self {
        Self::new(
            ApiErrorCode::MissingParameter,
            format!("missing required parameter: {name}"),
            json!({"parameter": name}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn validation_failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(
            ApiErrorCode::ValidationFailed,
            "validation failed",
            json!({"reason": reason}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = request_id.to_string();
        self
    }
}

const _: fn() = || {
    fn assert_traits<T: Serialize + for<'de> Deserialize<'de>>() {}
    assert_traits::<ApiErrorCode>();
};
