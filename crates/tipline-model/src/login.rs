// SPDX-License-Identifier: Apache-2.0

use crate::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sign-in attempt, appended by the identity boundary. Read only by
/// the admin login-history report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginHistoryEntry {
    pub user_id: UserId,
    pub login_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
}
