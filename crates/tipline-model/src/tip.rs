// SPDX-License-Identifier: Apache-2.0

use crate::ids::{TipId, UserId, ValidationError};
use crate::user::PlanType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TipAction {
    Buy,
    Sell,
    Watch,
}

impl TipAction {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            "WATCH" => Ok(Self::Watch),
            other => Err(ValidationError(format!("unknown tip action: {other}"))),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Watch => "WATCH",
        }
    }
}

impl Display for TipAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One piece of gated advisory content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    pub id: TipId,
    pub category: PlanType,
    pub stock_name: String,
    pub action: TipAction,
    pub entry_price: f64,
    /// Free text; may encode a range like "480-495".
    pub target_price: String,
    pub stop_loss: f64,
    pub timeframe: String,
    pub note: String,
    pub is_demo: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated mutable fields of a tip; used for both create and the
/// whole-record replace on update.
#[derive(Debug, Clone, PartialEq)]
pub struct TipDraft {
    pub category: PlanType,
    pub stock_name: String,
    pub action: TipAction,
    pub entry_price: f64,
    pub target_price: String,
    pub stop_loss: f64,
    pub timeframe: String,
    pub note: String,
    pub is_demo: bool,
}

impl TipDraft {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        category: PlanType,
        stock_name: &str,
        action: TipAction,
        entry_price: f64,
        target_price: &str,
        stop_loss: f64,
        timeframe: &str,
        note: &str,
        is_demo: bool,
    ) -> Result<Self, ValidationError> {
        let stock_name = stock_name.trim();
        if stock_name.is_empty() {
            return Err(ValidationError("stock name must not be empty".to_string()));
        }
        check_positive("entry_price", entry_price)?;
        check_positive("stop_loss", stop_loss)?;
        if target_price.trim().is_empty() {
            return Err(ValidationError(
                "target price must not be empty".to_string(),
            ));
        }
        Ok(Self {
            category,
            stock_name: stock_name.to_string(),
            action,
            entry_price,
            target_price: target_price.trim().to_string(),
            stop_loss,
            timeframe: timeframe.trim().to_string(),
            note: note.trim().to_string(),
            is_demo,
        })
    }
}

fn check_positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError(format!(
            "{field} must be a positive number, got {value}"
        )))
    }
}
