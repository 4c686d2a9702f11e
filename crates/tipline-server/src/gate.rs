// SPDX-License-Identifier: Apache-2.0

//! Content access gate.
//!
//! Every tips read goes through [`list_visible_tips`]; there is no other
//! read path. The tier is recomputed from the store on every call, so a
//! subscription that expired a millisecond ago already lands in the demo
//! tier, token freshness notwithstanding.

use chrono::{DateTime, Utc};
use tipline_model::{Role, Tip, UserId};
use tipline_store::{Store, StoreError};
use tracing::debug;

/// The resolved visibility tier, mostly useful for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    Admin,
    Subscriber,
    Demo,
}

pub async fn list_visible_tips(
    store: &Store,
    user_id: UserId,
    role: Role,
    now: DateTime<Utc>,
) -> Result<(AccessTier, Vec<Tip>), StoreError> {
    if role.is_admin() {
        let tips = store.list_all_tips().await?;
        return Ok((AccessTier::Admin, tips));
    }
    let entitlement = match store.entitlement(user_id, now).await {
        Ok(entitlement) => entitlement,
        // A session can outlive its user row; such callers get the demo
        // tier rather than an error.
        Err(StoreError::NotFound(_)) => {
            debug!(%user_id, "no user row behind session, serving demo tier");
            let tips = store.list_demo_tips().await?;
            return Ok((AccessTier::Demo, tips));
        }
        Err(other) => return Err(other),
    };
    match (entitlement.active, entitlement.plan_type) {
        (true, Some(plan_type)) => {
            let tips = store.list_tips_by_category(plan_type).await?;
            Ok((AccessTier::Subscriber, tips))
        }
        _ => {
            let tips = store.list_demo_tips().await?;
            Ok((AccessTier::Demo, tips))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tipline_model::{PlanType, TipAction, TipDraft};

    fn draft(category: PlanType, stock: &str, demo: bool) -> TipDraft {
        TipDraft::new(category, stock, TipAction::Buy, 100.0, "120", 90.0, "", "", demo)
            .expect("valid draft")
    }

    async fn seeded_store() -> (Store, UserId) {
        let store = Store::open_in_memory().expect("store");
        let admin = store
            .upsert_user_on_signin("a@example.com", None, None, Role::Admin, Utc::now())
            .await
            .unwrap();
        for (category, stock, demo) in [
            (PlanType::Equity, "TCS", false),
            (PlanType::Futures, "NIFTY-FUT", false),
            (PlanType::Equity, "DEMO-INFY", true),
        ] {
            store
                .create_tip(&draft(category, stock, demo), admin.id, Utc::now())
                .await
                .unwrap();
        }
        (store, admin.id)
    }

    #[tokio::test]
    async fn admin_sees_everything() {
        let (store, admin_id) = seeded_store().await;
        let (tier, tips) = list_visible_tips(&store, admin_id, Role::Admin, Utc::now())
            .await
            .unwrap();
        assert_eq!(tier, AccessTier::Admin);
        assert_eq!(tips.len(), 3);
    }

    #[tokio::test]
    async fn active_subscriber_sees_only_their_category() {
        let (store, _) = seeded_store().await;
        let now = Utc::now();
        let user = store
            .upsert_user_on_signin("s@example.com", None, None, Role::User, now)
            .await
            .unwrap();
        store
            .grant_entitlement(user.id, PlanType::Equity, now + Duration::days(30), now)
            .await
            .unwrap();

        let (tier, tips) = list_visible_tips(&store, user.id, Role::User, now)
            .await
            .unwrap();
        assert_eq!(tier, AccessTier::Subscriber);
        // Category match, demo flag irrelevant: the demo equity tip is
        // included, the futures tip is not.
        let stocks: Vec<&str> = tips.iter().map(|t| t.stock_name.as_str()).collect();
        assert!(stocks.contains(&"TCS"));
        assert!(stocks.contains(&"DEMO-INFY"));
        assert!(!stocks.contains(&"NIFTY-FUT"));
    }

    #[tokio::test]
    async fn expired_subscriber_falls_back_to_demo() {
        let (store, _) = seeded_store().await;
        let now = Utc::now();
        let user = store
            .upsert_user_on_signin("x@example.com", None, None, Role::User, now)
            .await
            .unwrap();
        store
            .grant_entitlement(user.id, PlanType::Futures, now + Duration::days(30), now)
            .await
            .unwrap();

        let later = now + Duration::days(31);
        let (tier, tips) = list_visible_tips(&store, user.id, Role::User, later)
            .await
            .unwrap();
        assert_eq!(tier, AccessTier::Demo);
        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].stock_name, "DEMO-INFY");
    }

    #[tokio::test]
    async fn session_without_user_row_gets_demo_tier() {
        let (store, _) = seeded_store().await;
        let (tier, tips) = list_visible_tips(&store, UserId(404), Role::User, Utc::now())
            .await
            .unwrap();
        assert_eq!(tier, AccessTier::Demo);
        assert_eq!(tips.len(), 1);
    }
}
