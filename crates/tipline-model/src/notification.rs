// SPDX-License-Identifier: Apache-2.0

use crate::ids::{NotificationId, UserId};
use crate::user::PlanType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub message: String,
    pub seen: bool,
    pub created_at: DateTime<Utc>,
}

/// The fixed fan-out message template. Kept in the model so the in-app
/// record, the realtime event, and the push body cannot drift apart.
#[must_use]
pub fn tip_notification_message(category: PlanType, stock_name: &str) -> String {
    format!("New {category} tip added: {stock_name}")
}
