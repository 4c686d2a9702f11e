#![forbid(unsafe_code)]
//! Tipline domain model SSOT.
//!
//! Every category, action, and entitlement rule is defined once here;
//! the store and server crates never re-derive them.

mod ids;
mod login;
mod notification;
mod payment;
mod plan;
mod tip;
mod user;

pub use ids::{NotificationId, PlanId, TipId, UserId, ValidationError};
pub use login::LoginHistoryEntry;
pub use notification::{tip_notification_message, Notification};
pub use payment::{PaymentRecord, PaymentStatus};
pub use plan::{plan_expiry_after, DurationUnit, Plan, PlanDraft, PlanDuration};
pub use tip::{Tip, TipAction, TipDraft};
pub use user::{validate_email, Entitlement, PlanType, Role, User};

pub const CRATE_NAME: &str = "tipline-model";
