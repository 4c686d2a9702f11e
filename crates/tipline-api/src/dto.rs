// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tipline_model::{PlanDuration, PlanType, Role, User, UserId};

fn default_false() -> bool {
    false
}

/// Identity-provider callback body. The email is already verified by the
/// provider; the server never trusts role fields from clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigninRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// User shape returned across the trust boundary. Push tokens and phone
/// numbers stay server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: Role,
    pub profile_completed: bool,
    pub is_subscribed: bool,
    pub plan_type: Option<PlanType>,
    pub plan_expiry: Option<DateTime<Utc>>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            image: user.image,
            role: user.role,
            profile_completed: user.profile_completed,
            is_subscribed: user.is_subscribed,
            plan_type: user.plan_type,
            plan_expiry: user.plan_expiry,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigninResponse {
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    pub amount: f64,
    pub plan_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub plan_id: i64,
    pub amount: f64,
}

/// Mutable tip fields as the admin UI submits them. No
/// `deny_unknown_fields` here: the struct is flattened into
/// [`TipUpdatePayload`], which serde does not allow to combine with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipPayload {
    pub category: String,
    pub stock_name: String,
    pub action: String,
    pub entry_price: f64,
    pub target_price: String,
    pub stop_loss: f64,
    pub timeframe: String,
    pub note: String,
    #[serde(default = "default_false")]
    pub is_demo: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipUpdatePayload {
    pub id: i64,
    #[serde(flatten)]
    pub fields: TipPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanPayload {
    pub name: String,
    pub price: f64,
    pub duration: PlanDuration,
    pub plan_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushTokenRequest {
    pub push_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtpSendRequest {
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtpVerifyRequest {
    pub phone: String,
    pub code: String,
}
