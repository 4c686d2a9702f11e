// SPDX-License-Identifier: Apache-2.0

use crate::ids::{PlanId, ValidationError};
use crate::user::PlanType;
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const PLAN_NAME_MAX_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Day,
    Month,
    Year,
}

impl DurationUnit {
    #[must_use]
    fn label(self, plural: bool) -> &'static str {
        match (self, plural) {
            (Self::Day, false) => "Day",
            (Self::Day, true) => "Days",
            (Self::Month, false) => "Month",
            (Self::Month, true) => "Months",
            (Self::Year, false) => "Year",
            (Self::Year, true) => "Years",
        }
    }
}

/// Structured subscription length. New plans are created from this; the
/// canonical string form (`"3 Months"`) is what gets stored, so legacy
/// records and new ones share one storage representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanDuration {
    pub magnitude: u32,
    pub unit: DurationUnit,
}

impl PlanDuration {
    pub fn new(magnitude: u32, unit: DurationUnit) -> Result<Self, ValidationError> {
        if magnitude == 0 {
            return Err(ValidationError(
                "plan duration magnitude must be >= 1".to_string(),
            ));
        }
        Ok(Self { magnitude, unit })
    }

    /// Strict parse of the canonical `"<n> <unit>[s]"` form.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let mut parts = input.split_whitespace();
        let magnitude: u32 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| ValidationError(format!("invalid plan duration: {input}")))?;
        let unit = match parts
            .next()
            .map(str::to_ascii_lowercase)
            .as_deref()
            .map(|u| u.trim_end_matches('s').to_string())
            .as_deref()
        {
            Some("day") => DurationUnit::Day,
            Some("month") => DurationUnit::Month,
            Some("year") => DurationUnit::Year,
            _ => return Err(ValidationError(format!("invalid plan duration: {input}"))),
        };
        if parts.next().is_some() {
            return Err(ValidationError(format!("invalid plan duration: {input}")));
        }
        Self::new(magnitude, unit)
    }

    #[must_use]
    pub fn expiry_from(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let n = self.magnitude;
        match self.unit {
            DurationUnit::Day => now + Duration::days(i64::from(n)),
            DurationUnit::Month => now.checked_add_months(Months::new(n)).unwrap_or(now),
            DurationUnit::Year => now
                .checked_add_months(Months::new(n.saturating_mul(12)))
                .unwrap_or(now),
        }
    }
}

impl Display for PlanDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}",
            self.magnitude,
            self.unit.label(self.magnitude != 1)
        )
    }
}

/// Compatibility shim for free-text durations on pre-existing plans.
///
/// Rules, in order: take the first run of digits as the magnitude
/// (default 1); then the first matching keyword wins: a string containing
/// "month" adds months, else "year" adds years, else "day" adds days, else
/// the expiry is `now` (no extension, e.g. `"Lifetime"`).
#[must_use]
pub fn plan_expiry_after(duration: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let lowered = duration.to_ascii_lowercase();
    let digits: String = lowered
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    let magnitude: u32 = digits.parse().unwrap_or(1);

    if lowered.contains("month") {
        now.checked_add_months(Months::new(magnitude)).unwrap_or(now)
    } else if lowered.contains("year") {
        now.checked_add_months(Months::new(magnitude.saturating_mul(12)))
            .unwrap_or(now)
    } else if lowered.contains("day") {
        now + Duration::days(i64::from(magnitude))
    } else {
        now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub price: f64,
    pub duration: String,
    pub plan_type: PlanType,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDraft {
    pub name: String,
    pub price: f64,
    pub duration: String,
    pub plan_type: PlanType,
    pub description: Option<String>,
}

impl PlanDraft {
    pub fn new(
        name: &str,
        price: f64,
        duration: PlanDuration,
        plan_type: PlanType,
        description: Option<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError("plan name must not be empty".to_string()));
        }
        if name.len() > PLAN_NAME_MAX_LEN {
            return Err(ValidationError(format!(
                "plan name exceeds max length {PLAN_NAME_MAX_LEN}"
            )));
        }
        if !(price > 0.0) || !price.is_finite() {
            return Err(ValidationError(format!(
                "plan price must be positive, got {price}"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            price,
            duration: duration.to_string(),
            plan_type,
            description,
        })
    }
}
