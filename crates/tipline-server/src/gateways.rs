// SPDX-License-Identifier: Apache-2.0

//! Capability traits for the external collaborators: payment gateway,
//! push-notification gateway, and the OTP/SMS verifier. The HTTP adapters
//! here are the only code that knows vendor wire shapes; everything else
//! talks to the traits.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};
use tipline_model::{PlanId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError(pub String);

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors embed URLs; keep only the classification.
        Self(format!("gateway request failed: {}", classify(&err)))
    }
}

fn classify(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_status() {
        "status"
    } else {
        "transport"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOrder {
    pub order_id: String,
    pub amount: f64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates an order for the amount; the gateway later signs
    /// `order_id|payment_id` with the shared secret.
    async fn create_order(
        &self,
        amount: f64,
        plan_id: PlanId,
        user_id: UserId,
    ) -> Result<PaymentOrder, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub url: String,
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Best-effort delivery to one registered device identifier.
    async fn deliver(&self, external_id: &str, message: &PushMessage) -> Result<(), GatewayError>;
}

#[async_trait]
pub trait OtpVerifier: Send + Sync {
    /// Sends a one-time code; returns the verification sid.
    async fn send_code(&self, phone: &str) -> Result<String, GatewayError>;
    /// Checks a submitted code. `Ok(false)` is a wrong code; `Err` is an
    /// upstream failure.
    async fn check_code(&self, phone: &str, code: &str) -> Result<bool, GatewayError>;
}

/// Strips leading zeros and applies the configured country prefix; numbers
/// already carrying a `+` prefix pass through untouched.
#[must_use]
pub fn normalize_phone(raw: &str, country_prefix: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('+') {
        return trimmed.to_string();
    }
    let stripped = trimmed.trim_start_matches('0');
    format!("{country_prefix}{stripped}")
}

pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl HttpPaymentGateway {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: String, key_id: String, key_secret: String) -> Self {
        Self {
            client,
            base_url,
            key_id,
            key_secret,
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(
        &self,
        amount: f64,
        plan_id: PlanId,
        user_id: UserId,
    ) -> Result<PaymentOrder, GatewayError> {
        // Gateways bill in minor units.
        let body = json!({
            "amount": (amount * 100.0).round() as i64,
            "currency": "INR",
            "notes": {"plan_id": plan_id, "user_id": user_id},
        });
        let resp = self
            .client
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let payload: Value = resp.json().await?;
        let order_id = payload
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError("order response missing id".to_string()))?
            .to_string();
        Ok(PaymentOrder {
            order_id,
            amount,
            currency: "INR".to_string(),
        })
    }
}

pub struct HttpPushGateway {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    app_id: String,
}

impl HttpPushGateway {
    #[must_use]
    pub fn new(client: reqwest::Client, api_url: String, api_key: String, app_id: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            app_id,
        }
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn deliver(&self, external_id: &str, message: &PushMessage) -> Result<(), GatewayError> {
        let body = json!({
            "app_id": self.app_id,
            "include_aliases": {"external_id": [external_id]},
            "headings": {"en": message.title},
            "contents": {"en": message.body},
            "url": message.url,
        });
        self.client
            .post(&self.api_url)
            .header("authorization", format!("Basic {}", self.api_key))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

pub struct HttpOtpVerifier {
    client: reqwest::Client,
    base_url: String,
    service_sid: String,
    auth_token: String,
}

impl HttpOtpVerifier {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        service_sid: String,
        auth_token: String,
    ) -> Self {
        Self {
            client,
            base_url,
            service_sid,
            auth_token,
        }
    }
}

#[async_trait]
impl OtpVerifier for HttpOtpVerifier {
    async fn send_code(&self, phone: &str) -> Result<String, GatewayError> {
        let resp = self
            .client
            .post(format!(
                "{}/Services/{}/Verifications",
                self.base_url, self.service_sid
            ))
            .basic_auth(&self.service_sid, Some(&self.auth_token))
            .form(&[("To", phone), ("Channel", "sms")])
            .send()
            .await?
            .error_for_status()?;
        let payload: Value = resp.json().await?;
        payload
            .get("sid")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GatewayError("verification response missing sid".to_string()))
    }

    async fn check_code(&self, phone: &str, code: &str) -> Result<bool, GatewayError> {
        let resp = self
            .client
            .post(format!(
                "{}/Services/{}/VerificationCheck",
                self.base_url, self.service_sid
            ))
            .basic_auth(&self.service_sid, Some(&self.auth_token))
            .form(&[("To", phone), ("Code", code)])
            .send()
            .await?
            .error_for_status()?;
        let payload: Value = resp.json().await?;
        Ok(payload.get("status").and_then(Value::as_str) == Some("approved"))
    }
}
