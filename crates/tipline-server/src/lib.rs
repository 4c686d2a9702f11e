#![forbid(unsafe_code)]
//! Tipline HTTP surface.
//!
//! The core pipeline: the payment engine writes entitlements, the content
//! gate filters tips per request, and tip creation fans notifications out
//! through the store, the realtime hub, and the push gateway.

use axum::routing::{get, post};
use axum::Router;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tipline_store::Store;

pub mod auth;
pub mod config;
pub mod fakes;
pub mod fanout;
pub mod gate;
pub mod gateways;
mod http;
mod middleware;
pub mod payments;
pub mod realtime;

pub use config::{validate_startup_config_contract, ApiConfig};
pub use gateways::{
    normalize_phone, GatewayError, HttpOtpVerifier, HttpPaymentGateway, HttpPushGateway,
    OtpVerifier, PaymentGateway, PaymentOrder, PushGateway, PushMessage,
};
pub use realtime::{init_realtime, realtime, NewNotificationEvent, RealtimeHub};

pub const CRATE_NAME: &str = "tipline-server";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub api: Arc<ApiConfig>,
    pub payment_gateway: Arc<dyn PaymentGateway>,
    pub push_gateway: Arc<dyn PushGateway>,
    pub otp_verifier: Arc<dyn OtpVerifier>,
    pub request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(
        store: Arc<Store>,
        api: ApiConfig,
        payment_gateway: Arc<dyn PaymentGateway>,
        push_gateway: Arc<dyn PushGateway>,
        otp_verifier: Arc<dyn OtpVerifier>,
    ) -> Self {
        Self {
            store,
            api: Arc::new(api),
            payment_gateway,
            push_gateway,
            otp_verifier,
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(http::healthz_handler))
        .route("/readyz", get(http::readyz_handler))
        .route("/v1/auth/signin", post(http::auth_profile::signin_handler))
        .route(
            "/v1/profile/check",
            get(http::auth_profile::profile_check_handler),
        )
        .route(
            "/v1/profile/update",
            post(http::auth_profile::profile_update_handler),
        )
        .route(
            "/v1/profile/push-token",
            post(http::auth_profile::push_token_handler),
        )
        .route("/v1/otp/send", post(http::auth_profile::otp_send_handler))
        .route(
            "/v1/otp/verify",
            post(http::auth_profile::otp_verify_handler),
        )
        .route(
            "/v1/payments/order",
            post(http::payments::create_order_handler),
        )
        .route(
            "/v1/payments/verify",
            post(http::payments::verify_payment_handler),
        )
        .route(
            "/v1/tips",
            get(http::tips::list_tips_handler)
                .post(http::tips::create_tip_handler)
                .put(http::tips::update_tip_handler)
                .delete(http::tips::delete_tip_handler),
        )
        .route(
            "/v1/plans",
            get(http::plans::list_plans_handler)
                .post(http::plans::create_plan_handler)
                .delete(http::plans::delete_plan_handler),
        )
        .route(
            "/v1/notifications",
            get(http::notifications::list_notifications_handler)
                .patch(http::notifications::mark_seen_handler),
        )
        .route("/v1/admin/stats", get(http::admin::stats_handler))
        .route(
            "/v1/admin/subscribers",
            get(http::admin::subscribers_handler),
        )
        .route(
            "/v1/admin/login-history",
            get(http::admin::login_history_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(axum::extract::DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
