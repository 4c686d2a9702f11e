// SPDX-License-Identifier: Apache-2.0

//! Server binary: env-driven config, startup validation, and the axum
//! serve loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tipline_server::{
    build_router, init_realtime, validate_startup_config_contract, ApiConfig, AppState,
    HttpOtpVerifier, HttpPaymentGateway, HttpPushGateway, OtpVerifier, PaymentGateway, PushGateway,
};
use tipline_store::Store;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn env_str(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_duration_secs(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn config_from_env() -> ApiConfig {
    let defaults = ApiConfig::default();
    ApiConfig {
        admin_email: env_str("TIPLINE_ADMIN_EMAIL", ""),
        payment_secret: env_str("TIPLINE_PAYMENT_SECRET", ""),
        session_secret: env_str("TIPLINE_SESSION_SECRET", ""),
        session_ttl: env_duration_secs("TIPLINE_SESSION_TTL_SECS", defaults.session_ttl),
        push_app_id: env_str("TIPLINE_PUSH_APP_ID", ""),
        site_url: env_str("TIPLINE_SITE_URL", &defaults.site_url),
        phone_country_prefix: env_str(
            "TIPLINE_PHONE_COUNTRY_PREFIX",
            &defaults.phone_country_prefix,
        ),
        push_timeout: env_duration_secs("TIPLINE_PUSH_TIMEOUT_SECS", defaults.push_timeout),
        max_body_bytes: env_usize("TIPLINE_MAX_BODY_BYTES", defaults.max_body_bytes),
        login_history_limit: env_usize("TIPLINE_LOGIN_HISTORY_LIMIT", defaults.login_history_limit),
    }
}

fn gateways_from_env(
    api: &ApiConfig,
) -> Result<
    (
        Arc<dyn PaymentGateway>,
        Arc<dyn PushGateway>,
        Arc<dyn OtpVerifier>,
    ),
    Box<dyn std::error::Error>,
> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(env_u64("TIPLINE_HTTP_TIMEOUT_SECS", 10)))
        .build()?;

    let payment: Arc<dyn PaymentGateway> = Arc::new(HttpPaymentGateway::new(
        client.clone(),
        env_str("TIPLINE_PAYMENT_API_URL", "https://api.razorpay.com/v1"),
        env_str("TIPLINE_PAYMENT_KEY_ID", ""),
        env_str("TIPLINE_PAYMENT_KEY_SECRET", ""),
    ));
    let push: Arc<dyn PushGateway> = Arc::new(HttpPushGateway::new(
        client.clone(),
        env_str(
            "TIPLINE_PUSH_API_URL",
            "https://onesignal.com/api/v1/notifications",
        ),
        env_str("TIPLINE_PUSH_API_KEY", ""),
        api.push_app_id.clone(),
    ));
    let otp: Arc<dyn OtpVerifier> = Arc::new(HttpOtpVerifier::new(
        client,
        env_str("TIPLINE_OTP_API_URL", "https://verify.twilio.com/v2"),
        env_str("TIPLINE_OTP_SERVICE_SID", ""),
        env_str("TIPLINE_OTP_AUTH_TOKEN", ""),
    ));
    Ok((payment, push, otp))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("info,{}=info", env!("CARGO_CRATE_NAME")))
        }))
        .init();

    let api = config_from_env();
    validate_startup_config_contract(&api)?;

    let db_path = PathBuf::from(env_str("TIPLINE_DB_PATH", "tipline.db"));
    let store = Arc::new(Store::open(&db_path)?);
    info!(path = %db_path.display(), "store opened");

    init_realtime();

    let (payment_gateway, push_gateway, otp_verifier) = gateways_from_env(&api)?;
    let state = AppState::new(store, api, payment_gateway, push_gateway, otp_verifier);
    let app = build_router(state);

    let addr = env_str("TIPLINE_LISTEN_ADDR", "0.0.0.0:8080");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
