// SPDX-License-Identifier: Apache-2.0

//! Notification fan-out for freshly created tips.
//!
//! Durable first, lossy second: the in-app notification rows are written in
//! one batch before any realtime or push delivery is attempted. Realtime
//! and push are best effort; their failures are logged and never bubble up
//! to the tip-creation response.

use crate::gateways::{PushGateway, PushMessage};
use crate::realtime::{realtime, NewNotificationEvent};
use crate::ApiConfig;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tipline_model::{tip_notification_message, Tip, User};
use tipline_store::{Store, StoreError};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// What a fan-out run actually did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FanoutReport {
    pub recipients: usize,
    pub stored: usize,
    pub realtime_emitted: usize,
    pub push_delivered: usize,
    pub push_failed: usize,
}

fn push_message(tip: &Tip, api: &ApiConfig) -> PushMessage {
    PushMessage {
        title: "New Tip Added!".to_string(),
        body: format!(
            "{} — {}",
            tip.category.as_str().to_uppercase(),
            tip.stock_name
        ),
        url: format!("{}/tips", api.site_url),
    }
}

/// Runs the whole pipeline for one created tip. Demo tips fan out to
/// nobody. Store failures propagate; delivery failures do not.
pub async fn on_tip_created(
    store: &Store,
    push_gateway: &Arc<dyn PushGateway>,
    api: &ApiConfig,
    tip: &Tip,
    now: DateTime<Utc>,
) -> Result<FanoutReport, StoreError> {
    if tip.is_demo {
        return Ok(FanoutReport::default());
    }

    let recipients = store.eligible_recipients(tip.category, now).await?;
    if recipients.is_empty() {
        info!(tip_id = %tip.id, category = %tip.category, "fan-out found no recipients");
        return Ok(FanoutReport::default());
    }

    let message = tip_notification_message(tip.category, &tip.stock_name);
    let batch: Vec<_> = recipients
        .iter()
        .map(|user| (user.id, message.clone()))
        .collect();
    let stored = store.insert_notifications(&batch, now).await?;

    let realtime_emitted = emit_realtime(&recipients, &message, now).await;
    let (push_delivered, push_failed) =
        deliver_push(push_gateway, api, &recipients, &push_message(tip, api)).await;

    let report = FanoutReport {
        recipients: recipients.len(),
        stored,
        realtime_emitted,
        push_delivered,
        push_failed,
    };
    info!(
        tip_id = %tip.id,
        category = %tip.category,
        recipients = report.recipients,
        push_delivered = report.push_delivered,
        push_failed = report.push_failed,
        "fan-out complete"
    );
    Ok(report)
}

async fn emit_realtime(recipients: &[User], message: &str, now: DateTime<Utc>) -> usize {
    let Some(hub) = realtime() else {
        warn!("realtime hub not initialized, skipping emit");
        return 0;
    };
    for user in recipients {
        hub.emit(NewNotificationEvent {
            user_id: user.id,
            message: message.to_string(),
            created_at: now,
        })
        .await;
    }
    recipients.len()
}

/// Concurrent per-recipient delivery under a per-recipient budget. One slow
/// or failing device never blocks the rest.
async fn deliver_push(
    push_gateway: &Arc<dyn PushGateway>,
    api: &ApiConfig,
    recipients: &[User],
    message: &PushMessage,
) -> (usize, usize) {
    let mut tasks = JoinSet::new();
    for user in recipients {
        let Some(token) = user.push_token.clone() else {
            continue;
        };
        let gateway = Arc::clone(push_gateway);
        let message = message.clone();
        let budget = api.push_timeout;
        let user_id = user.id;
        tasks.spawn(async move {
            let outcome = tokio::time::timeout(budget, gateway.deliver(&token, &message)).await;
            match outcome {
                Ok(Ok(())) => true,
                Ok(Err(err)) => {
                    warn!(%user_id, %err, "push delivery failed");
                    false
                }
                Err(_) => {
                    warn!(%user_id, "push delivery timed out");
                    false
                }
            }
        });
    }

    let mut delivered = 0;
    let mut failed = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(true) => delivered += 1,
            Ok(false) => failed += 1,
            Err(err) => {
                warn!(%err, "push delivery task panicked");
                failed += 1;
            }
        }
    }
    (delivered, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::RecordingPushGateway;
    use chrono::Duration;
    use tipline_model::{PlanType, Role, TipAction, TipDraft, UserId};

    async fn user_with_push(
        store: &Store,
        email: &str,
        category: PlanType,
        token: &str,
        now: DateTime<Utc>,
    ) -> UserId {
        let user = store
            .upsert_user_on_signin(email, None, None, Role::User, now)
            .await
            .unwrap();
        store
            .grant_entitlement(user.id, category, now + Duration::days(30), now)
            .await
            .unwrap();
        store.set_push_token(user.id, token, now).await.unwrap();
        user.id
    }

    async fn equity_tip(store: &Store, demo: bool, now: DateTime<Utc>) -> Tip {
        let admin = store
            .upsert_user_on_signin("a@example.com", None, None, Role::Admin, now)
            .await
            .unwrap();
        let draft =
            TipDraft::new(PlanType::Equity, "TCS", TipAction::Buy, 100.0, "120", 90.0, "", "", demo)
                .unwrap();
        store.create_tip(&draft, admin.id, now).await.unwrap()
    }

    #[tokio::test]
    async fn demo_tips_fan_out_to_nobody() {
        let store = Store::open_in_memory().unwrap();
        let now = Utc::now();
        user_with_push(&store, "u@example.com", PlanType::Equity, "tok-1", now).await;
        let tip = equity_tip(&store, true, now).await;

        let gateway: Arc<dyn PushGateway> = Arc::new(RecordingPushGateway::default());
        let report = on_tip_created(&store, &gateway, &ApiConfig::default(), &tip, now)
            .await
            .unwrap();
        assert_eq!(report, FanoutReport::default());
    }

    #[tokio::test]
    async fn notifications_land_for_matching_recipients_only() {
        let store = Store::open_in_memory().unwrap();
        let now = Utc::now();
        let equity_id =
            user_with_push(&store, "e@example.com", PlanType::Equity, "tok-e", now).await;
        user_with_push(&store, "f@example.com", PlanType::Futures, "tok-f", now).await;
        let tip = equity_tip(&store, false, now).await;

        let recorder = Arc::new(RecordingPushGateway::default());
        let gateway: Arc<dyn PushGateway> = recorder.clone();
        let report = on_tip_created(&store, &gateway, &ApiConfig::default(), &tip, now)
            .await
            .unwrap();
        assert_eq!(report.recipients, 1);
        assert_eq!(report.stored, 1);
        assert_eq!(report.push_delivered, 1);

        let rows = store.notifications_for_user(equity_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message, "New equity tip added: TCS");
        assert_eq!(recorder.delivered_to().await, vec!["tok-e".to_string()]);
    }

    #[tokio::test]
    async fn one_failing_device_does_not_block_the_rest() {
        let store = Store::open_in_memory().unwrap();
        let now = Utc::now();
        user_with_push(&store, "a1@example.com", PlanType::Equity, "tok-bad", now).await;
        user_with_push(&store, "a2@example.com", PlanType::Equity, "tok-good", now).await;
        let tip = equity_tip(&store, false, now).await;

        let recorder = Arc::new(RecordingPushGateway {
            fail_for: Some("tok-bad".to_string()),
            ..RecordingPushGateway::default()
        });
        let gateway: Arc<dyn PushGateway> = recorder.clone();
        let report = on_tip_created(&store, &gateway, &ApiConfig::default(), &tip, now)
            .await
            .unwrap();
        assert_eq!(report.recipients, 2);
        assert_eq!(report.stored, 2, "rows stored even for failed devices");
        assert_eq!(report.push_delivered, 1);
        assert_eq!(report.push_failed, 1);
        assert_eq!(recorder.delivered_to().await, vec!["tok-good".to_string()]);
    }

    #[test]
    fn push_body_uses_uppercase_category() {
        let api = ApiConfig {
            site_url: "https://tips.example.com".to_string(),
            ..ApiConfig::default()
        };
        let tip = Tip {
            id: tipline_model::TipId(1),
            category: PlanType::Equity,
            stock_name: "TCS".to_string(),
            action: TipAction::Buy,
            entry_price: 100.0,
            target_price: "120".to_string(),
            stop_loss: 90.0,
            timeframe: String::new(),
            note: String::new(),
            is_demo: false,
            created_by: UserId(1),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let message = push_message(&tip, &api);
        assert_eq!(message.title, "New Tip Added!");
        assert_eq!(message.body, "EQUITY — TCS");
        assert_eq!(message.url, "https://tips.example.com/tips");
    }
}
