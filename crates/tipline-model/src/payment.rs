// SPDX-License-Identifier: Apache-2.0

use crate::ids::{PlanId, UserId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
}

impl PaymentStatus {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "success" => Ok(Self::Success),
            other => Err(ValidationError(format!("unknown payment status: {other}"))),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
        }
    }
}

/// Append-only audit row written before any entitlement change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub order_id: String,
    pub payment_id: String,
    pub amount: f64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}
