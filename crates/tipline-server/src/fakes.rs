// SPDX-License-Identifier: Apache-2.0

//! In-memory gateway doubles for tests and local development.

use crate::gateways::{
    GatewayError, OtpVerifier, PaymentGateway, PaymentOrder, PushGateway, PushMessage,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tipline_model::{PlanId, UserId};
use tokio::sync::Mutex;

/// Hands out sequential order ids; optionally fails every call to model a
/// gateway outage.
pub struct StaticPaymentGateway {
    pub counter: AtomicU64,
    pub fail: bool,
}

impl Default for StaticPaymentGateway {
    fn default() -> Self {
        Self {
            counter: AtomicU64::new(1),
            fail: false,
        }
    }
}

#[async_trait]
impl PaymentGateway for StaticPaymentGateway {
    async fn create_order(
        &self,
        amount: f64,
        _plan_id: PlanId,
        _user_id: UserId,
    ) -> Result<PaymentOrder, GatewayError> {
        if self.fail {
            return Err(GatewayError("gateway down".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(PaymentOrder {
            order_id: format!("order_{n}"),
            amount,
            currency: "INR".to_string(),
        })
    }
}

/// Records every delivery attempt; can be told to fail for one external id
/// so per-recipient isolation is testable.
#[derive(Default)]
pub struct RecordingPushGateway {
    pub deliveries: Mutex<Vec<(String, PushMessage)>>,
    pub fail_for: Option<String>,
}

impl RecordingPushGateway {
    pub async fn delivered_to(&self) -> Vec<String> {
        self.deliveries
            .lock()
            .await
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait]
impl PushGateway for RecordingPushGateway {
    async fn deliver(&self, external_id: &str, message: &PushMessage) -> Result<(), GatewayError> {
        if self.fail_for.as_deref() == Some(external_id) {
            return Err(GatewayError(format!("delivery refused for {external_id}")));
        }
        self.deliveries
            .lock()
            .await
            .push((external_id.to_string(), message.clone()));
        Ok(())
    }
}

/// Accepts exactly one code.
pub struct StaticOtpVerifier {
    pub accepted_code: String,
}

impl Default for StaticOtpVerifier {
    fn default() -> Self {
        Self {
            accepted_code: "123456".to_string(),
        }
    }
}

#[async_trait]
impl OtpVerifier for StaticOtpVerifier {
    async fn send_code(&self, phone: &str) -> Result<String, GatewayError> {
        Ok(format!("VE-{phone}"))
    }

    async fn check_code(&self, _phone: &str, code: &str) -> Result<bool, GatewayError> {
        Ok(code == self.accepted_code)
    }
}
