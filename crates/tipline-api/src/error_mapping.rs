// SPDX-License-Identifier: Apache-2.0

use crate::errors::{ApiError, ApiErrorCode};

/// HTTP status for an error envelope. `UpstreamUnavailable` maps to 502 for
/// synchronous gateway calls; fan-out delivery failures never reach this
/// mapping because they are logged and swallowed.
#[must_use]
pub fn map_error_status(error: &ApiError) -> u16 {
    match error.code {
        ApiErrorCode::Unauthenticated => 401,
        ApiErrorCode::Forbidden => 403,
        ApiErrorCode::NotFound | ApiErrorCode::PlanNotFound => 404,
        ApiErrorCode::InvalidSignature
        | ApiErrorCode::ValidationFailed
        | ApiErrorCode::MissingParameter => 400,
        ApiErrorCode::UpstreamUnavailable => 502,
        ApiErrorCode::Internal => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn taxonomy_maps_to_documented_statuses() {
        let cases = [
            (ApiErrorCode::Unauthenticated, 401),
            (ApiErrorCode::Forbidden, 403),
            (ApiErrorCode::NotFound, 404),
            (ApiErrorCode::PlanNotFound, 404),
            (ApiErrorCode::InvalidSignature, 400),
            (ApiErrorCode::ValidationFailed, 400),
            (ApiErrorCode::MissingParameter, 400),
            (ApiErrorCode::UpstreamUnavailable, 502),
            (ApiErrorCode::Internal, 500),
        ];
        for (code, status) in cases {
            let err = ApiError::new(code, "x", json!({}), "req-unknown");
            assert_eq!(map_error_status(&err), status, "{code:?}");
        }
    }
}
