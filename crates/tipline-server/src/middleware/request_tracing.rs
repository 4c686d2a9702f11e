// SPDX-License-Identifier: Apache-2.0

//! Per-request tracing span and request-id stamping. Callers may supply
//! their own `x-request-id`; otherwise one is minted from the process
//! seed. The id rides in request extensions for handlers and comes back
//! on the response.

use crate::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::atomic::Ordering;
use tracing::{info_span, Instrument};

#[derive(Debug, Clone)]
pub(crate) struct RequestId(pub String);

pub(crate) async fn request_tracing_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!("req-{}", state.request_id_seed.fetch_add(1, Ordering::Relaxed))
        });

    let span = info_span!(
        "http_request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}
