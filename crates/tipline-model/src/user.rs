// SPDX-License-Identifier: Apache-2.0

use crate::ids::{UserId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Content category a plan entitles a user to. Closed set; the wire uses
/// the lower-case names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Equity,
    Futures,
    Options,
}

impl PlanType {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "equity" => Ok(Self::Equity),
            "futures" => Ok(Self::Futures),
            "options" => Ok(Self::Options),
            other => Err(ValidationError(format!("unknown plan type: {other}"))),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equity => "equity",
            Self::Futures => "futures",
            Self::Options => "options",
        }
    }
}

impl Display for PlanType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(ValidationError(format!("unknown role: {other}"))),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computed access state; see [`User::entitlement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entitlement {
    pub active: bool,
    pub plan_type: Option<PlanType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: Role,
    pub location: Option<String>,
    pub age: Option<u32>,
    pub phone: Option<String>,
    pub profile_completed: bool,
    pub is_subscribed: bool,
    pub plan_type: Option<PlanType>,
    pub plan_expiry: Option<DateTime<Utc>>,
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Entitlement is active iff subscribed with an expiry strictly in the
    /// future. `now == plan_expiry` is expired.
    #[must_use]
    pub fn entitlement(&self, now: DateTime<Utc>) -> Entitlement {
        let active = self.is_subscribed && self.plan_expiry.is_some_and(|expiry| expiry > now);
        Entitlement {
            active,
            plan_type: self.plan_type,
        }
    }

    #[must_use]
    pub fn has_push_registration(&self) -> bool {
        self.push_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

pub fn validate_email(input: &str) -> Result<String, ValidationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ValidationError("email must not be empty".to_string()));
    }
    let Some((local, domain)) = s.split_once('@') else {
        return Err(ValidationError(format!("invalid email: {s}")));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ValidationError(format!("invalid email: {s}")));
    }
    Ok(s.to_ascii_lowercase())
}
