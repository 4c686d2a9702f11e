// SPDX-License-Identifier: Apache-2.0

//! Payment verification engine.
//!
//! The one path that grants entitlement. Order of operations is load-
//! bearing: signature check, then the durable audit record, then the plan
//! lookup, then the conditional grant. A failure anywhere leaves the user
//! exactly as they were; there is deliberately no rollback of the audit
//! record (it is the replay source if the grant is ever lost).

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt::{Display, Formatter};
use tipline_model::{
    plan_expiry_after, PaymentRecord, PaymentStatus, PlanDuration, PlanId, UserId,
};
use tipline_store::{Store, StoreError};
use tracing::{info, warn};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Supplied signature does not match; possible tamper, never retried.
    InvalidSignature,
    PlanNotFound(PlanId),
    UserNotFound(UserId),
    Storage(String),
}

impl Display for VerificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "invalid payment signature"),
            Self::PlanNotFound(id) => write!(f, "plan {id} not found"),
            Self::UserNotFound(id) => write!(f, "user {id} not found"),
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for VerificationError {}

impl From<StoreError> for VerificationError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Hex HMAC-SHA256 over `order_id|payment_id`, as the gateway computes it.
#[must_use]
pub fn expected_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison against the supplied hex signature.
#[must_use]
pub fn signature_matches(secret: &str, order_id: &str, payment_id: &str, supplied: &str) -> bool {
    let Ok(supplied_raw) = hex::decode(supplied) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac.verify_slice(&supplied_raw).is_ok()
}

/// Plan expiry: structured duration strings take the exact path, anything
/// else goes through the legacy free-text shim.
#[must_use]
pub fn compute_expiry(duration: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    match PlanDuration::parse(duration) {
        Ok(parsed) => parsed.expiry_from(now),
        Err(_) => plan_expiry_after(duration, now),
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn verify_and_grant(
    store: &Store,
    payment_secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
    plan_id: PlanId,
    user_id: UserId,
    amount: f64,
    now: DateTime<Utc>,
) -> Result<(), VerificationError> {
    if !signature_matches(payment_secret, order_id, payment_id, signature) {
        warn!(%user_id, %plan_id, order_id, "payment signature mismatch");
        return Err(VerificationError::InvalidSignature);
    }

    // Audit trail first: a crash after this point is replayable, a crash
    // before it grants nothing.
    store
        .append_payment(&PaymentRecord {
            user_id,
            plan_id,
            order_id: order_id.to_string(),
            payment_id: payment_id.to_string(),
            amount,
            status: PaymentStatus::Success,
            created_at: now,
        })
        .await?;

    let plan = store
        .plan_by_id(plan_id)
        .await?
        .ok_or(VerificationError::PlanNotFound(plan_id))?;

    let expiry = compute_expiry(&plan.duration, now);
    let applied = match store
        .grant_entitlement(user_id, plan.plan_type, expiry, now)
        .await
    {
        Ok(applied) => applied,
        Err(StoreError::NotFound(_)) => return Err(VerificationError::UserNotFound(user_id)),
        Err(other) => return Err(other.into()),
    };

    if applied {
        info!(%user_id, plan_type = %plan.plan_type, %expiry, "entitlement granted");
    } else {
        info!(%user_id, %expiry, "entitlement unchanged; stored expiry is later");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Months;
    use tipline_model::{PlanDraft, PlanType, Role};

    const SECRET: &str = "gateway-shared-secret";

    async fn store_with_user_and_plan(duration: &str) -> (Store, UserId, PlanId) {
        let store = Store::open_in_memory().expect("store");
        let user = store
            .upsert_user_on_signin("u@example.com", None, None, Role::User, Utc::now())
            .await
            .unwrap();
        let draft = PlanDraft {
            name: "Equity Pro".to_string(),
            price: 999.0,
            duration: duration.to_string(),
            plan_type: PlanType::Equity,
            description: None,
        };
        let plan = store.create_plan(&draft, Utc::now()).await.unwrap();
        (store, user.id, plan.id)
    }

    #[tokio::test]
    async fn tampered_signature_leaves_user_and_audit_untouched() {
        let (store, user_id, plan_id) = store_with_user_and_plan("3 Months").await;
        let before = store.user_by_id(user_id).await.unwrap().unwrap();

        let err = verify_and_grant(
            &store,
            SECRET,
            "order_1",
            "pay_1",
            "deadbeef",
            plan_id,
            user_id,
            999.0,
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, VerificationError::InvalidSignature);

        let after = store.user_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(before, after, "entitlement state must be identical");
        assert_eq!(store.count_payments().await.unwrap(), 0, "no audit row");
    }

    #[tokio::test]
    async fn valid_signature_grants_month_based_expiry() {
        let (store, user_id, plan_id) = store_with_user_and_plan("3 Months").await;
        let now = Utc::now();
        let signature = expected_signature(SECRET, "order_1", "pay_1");

        verify_and_grant(
            &store, SECRET, "order_1", "pay_1", &signature, plan_id, user_id, 999.0, now,
        )
        .await
        .unwrap();

        let user = store.user_by_id(user_id).await.unwrap().unwrap();
        assert!(user.is_subscribed);
        assert_eq!(user.plan_type, Some(PlanType::Equity));
        let expected = now.checked_add_months(Months::new(3)).unwrap();
        assert_eq!(
            user.plan_expiry.map(|e| e.timestamp_millis()),
            Some(expected.timestamp_millis())
        );
        assert_eq!(store.count_payments().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn lifetime_style_duration_grants_no_extension() {
        let (store, user_id, plan_id) = store_with_user_and_plan("Lifetime").await;
        let now = Utc::now();
        let signature = expected_signature(SECRET, "order_2", "pay_2");

        verify_and_grant(
            &store, SECRET, "order_2", "pay_2", &signature, plan_id, user_id, 4999.0, now,
        )
        .await
        .unwrap();

        let user = store.user_by_id(user_id).await.unwrap().unwrap();
        // Expiry equals "now": subscribed on paper, inactive in practice.
        assert_eq!(
            user.plan_expiry.map(|e| e.timestamp_millis()),
            Some(now.timestamp_millis())
        );
        assert!(!user.entitlement(now).active);
    }

    #[tokio::test]
    async fn missing_plan_halts_after_audit_but_before_grant() {
        let (store, user_id, _) = store_with_user_and_plan("1 Year").await;
        let missing = PlanId(777);
        let signature = expected_signature(SECRET, "order_3", "pay_3");

        let err = verify_and_grant(
            &store, SECRET, "order_3", "pay_3", &signature, missing, user_id, 999.0,
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, VerificationError::PlanNotFound(missing));

        let user = store.user_by_id(user_id).await.unwrap().unwrap();
        assert!(!user.is_subscribed, "no partial grant");
        // The audit row exists: the known durability-ordering gap.
        assert_eq!(store.count_payments().await.unwrap(), 1);
    }

    #[test]
    fn signature_check_rejects_malformed_hex() {
        assert!(!signature_matches(SECRET, "o", "p", "not-hex"));
        assert!(!signature_matches(SECRET, "o", "p", ""));
        let good = expected_signature(SECRET, "o", "p");
        assert!(signature_matches(SECRET, "o", "p", &good));
        assert!(!signature_matches(SECRET, "o", "p2", &good));
    }
}
