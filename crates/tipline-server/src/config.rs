// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    /// The one email that gets the admin role on first sign-in.
    pub admin_email: String,
    /// Shared secret between the payment gateway integration and the
    /// verification engine. Signatures are HMAC-SHA256 over
    /// `order_id|payment_id` keyed by this.
    pub payment_secret: String,
    /// Key for signing session claims tokens.
    pub session_secret: String,
    pub session_ttl: Duration,
    /// App identifier the push gateway requires in every delivery.
    pub push_app_id: String,
    /// Public site URL; push notifications deep-link to `{site_url}/tips`.
    pub site_url: String,
    /// Country prefix applied to normalized phone numbers, e.g. "+91".
    pub phone_country_prefix: String,
    /// Per-recipient push delivery budget inside fan-out.
    pub push_timeout: Duration,
    pub max_body_bytes: usize,
    pub login_history_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            admin_email: String::new(),
            payment_secret: String::new(),
            session_secret: String::new(),
            session_ttl: Duration::from_secs(7 * 24 * 3600),
            push_app_id: String::new(),
            site_url: "http://localhost:3000".to_string(),
            phone_country_prefix: "+91".to_string(),
            push_timeout: Duration::from_secs(5),
            max_body_bytes: 16 * 1024,
            login_history_limit: 100,
        }
    }
}

pub fn validate_startup_config_contract(api: &ApiConfig) -> Result<(), String> {
    if api.payment_secret.is_empty() {
        return Err("payment_secret must be set".to_string());
    }
    if api.session_secret.is_empty() {
        return Err("session_secret must be set".to_string());
    }
    if !api.admin_email.contains('@') {
        return Err("admin_email must be a valid email address".to_string());
    }
    if api.session_ttl.is_zero() || api.push_timeout.is_zero() {
        return Err("timeouts must be > 0".to_string());
    }
    if api.max_body_bytes == 0 {
        return Err("max_body_bytes must be > 0".to_string());
    }
    if !api.phone_country_prefix.starts_with('+') {
        return Err("phone_country_prefix must start with '+'".to_string());
    }
    Ok(())
}
