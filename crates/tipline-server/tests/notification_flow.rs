// SPDX-License-Identifier: Apache-2.0

mod support;

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use support::{bearer, send_raw, sign_payment, signin, spawn_app, ADMIN_EMAIL};
use tipline_model::{PlanType, UserId};
use tipline_server::init_realtime;

fn tip_payload(category: &str, stock: &str, demo: bool) -> Value {
    json!({
        "category": category,
        "stock_name": stock,
        "action": "BUY",
        "entry_price": 100.0,
        "target_price": "120",
        "stop_loss": 90.0,
        "timeframe": "1 week",
        "note": "",
        "is_demo": demo
    })
}

async fn post_tip(addr: std::net::SocketAddr, token: &str, payload: &Value) -> u16 {
    let (status, _, _) = send_raw(
        addr,
        "POST",
        "/v1/tips",
        &[("authorization", &bearer(token))],
        Some(payload),
    )
    .await;
    status
}

/// Signs a user in and grants an entitlement with an optional device.
async fn subscriber(
    app: &support::TestApp,
    email: &str,
    category: PlanType,
    push_token: Option<&str>,
) -> UserId {
    let (_, user) = signin(app.addr, email).await;
    let user_id = UserId(user.get("id").and_then(Value::as_i64).unwrap());
    let now = Utc::now();
    app.store
        .grant_entitlement(user_id, category, now + Duration::days(30), now)
        .await
        .unwrap();
    if let Some(token) = push_token {
        app.store.set_push_token(user_id, token, now).await.unwrap();
    }
    user_id
}

#[tokio::test]
async fn demo_tips_trigger_no_fanout() {
    let app = spawn_app().await;
    subscriber(&app, "sub@example.com", PlanType::Equity, Some("tok-sub")).await;
    let (admin_token, _) = signin(app.addr, ADMIN_EMAIL).await;

    assert_eq!(
        post_tip(app.addr, &admin_token, &tip_payload("equity", "DEMO", true)).await,
        201
    );
    assert!(app.push.delivered_to().await.is_empty());
}

#[tokio::test]
async fn fanout_reaches_exactly_the_eligible_population() {
    let app = spawn_app().await;
    let now = Utc::now();

    let matching =
        subscriber(&app, "match@example.com", PlanType::Equity, Some("tok-match")).await;
    let wrong_category =
        subscriber(&app, "futures@example.com", PlanType::Futures, Some("tok-fut")).await;
    let no_device = subscriber(&app, "nodevice@example.com", PlanType::Equity, None).await;

    // Expired equity subscriber with a device.
    let (_, lapsed_user) = signin(app.addr, "lapsed@example.com").await;
    let lapsed = UserId(lapsed_user.get("id").and_then(Value::as_i64).unwrap());
    app.store
        .grant_entitlement(lapsed, PlanType::Equity, now - Duration::days(1), now - Duration::days(40))
        .await
        .unwrap();
    app.store.set_push_token(lapsed, "tok-lapsed", now).await.unwrap();

    let (admin_token, _) = signin(app.addr, ADMIN_EMAIL).await;
    assert_eq!(
        post_tip(app.addr, &admin_token, &tip_payload("equity", "TCS", false)).await,
        201
    );

    // Push went only to the active equity subscriber with a device.
    assert_eq!(app.push.delivered_to().await, vec!["tok-match".to_string()]);

    // The stored rows mirror the push recipient set.
    let rows = app.store.notifications_for_user(matching).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].message, "New equity tip added: TCS");
    assert!(!rows[0].seen);
    for excluded in [wrong_category, no_device, lapsed] {
        assert!(app
            .store
            .notifications_for_user(excluded)
            .await
            .unwrap()
            .is_empty());
    }
}

#[tokio::test]
async fn realtime_sessions_receive_the_event() {
    let app = spawn_app().await;
    let user_id =
        subscriber(&app, "live@example.com", PlanType::Options, Some("tok-live")).await;
    let hub = init_realtime();
    let mut events = hub.subscribe(user_id).await;

    let (admin_token, _) = signin(app.addr, ADMIN_EMAIL).await;
    assert_eq!(
        post_tip(app.addr, &admin_token, &tip_payload("options", "BANKNIFTY", false)).await,
        201
    );

    // The hub is process-wide, so filter on our own user id.
    let event = loop {
        let event = tokio::time::timeout(std::time::Duration::from_secs(2), events.recv())
            .await
            .expect("event within budget")
            .expect("channel open");
        if event.user_id == user_id {
            break event;
        }
    };
    assert_eq!(event.message, "New options tip added: BANKNIFTY");
}

#[tokio::test]
async fn notification_list_and_mark_seen_are_owner_scoped() {
    let app = spawn_app().await;
    subscriber(&app, "reader@example.com", PlanType::Equity, Some("tok-r")).await;
    let (reader_token, _) = signin(app.addr, "reader@example.com").await;
    let (admin_token, _) = signin(app.addr, ADMIN_EMAIL).await;

    assert_eq!(
        post_tip(app.addr, &admin_token, &tip_payload("equity", "TCS", false)).await,
        201
    );
    assert_eq!(
        post_tip(app.addr, &admin_token, &tip_payload("equity", "INFY", false)).await,
        201
    );

    let (status, _, body) = send_raw(
        app.addr,
        "GET",
        "/v1/notifications",
        &[("authorization", &bearer(&reader_token))],
        None,
    )
    .await;
    assert_eq!(status, 200);
    let rows: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.get("seen") == Some(&json!(false))));

    // Another user sees nothing.
    let (other_token, _) = signin(app.addr, "other@example.com").await;
    let (_, _, body) = send_raw(
        app.addr,
        "GET",
        "/v1/notifications",
        &[("authorization", &bearer(&other_token))],
        None,
    )
    .await;
    let rows: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert!(rows.is_empty());

    // Mark seen, then again: idempotent.
    for expected_updated in [2, 0] {
        let (status, _, body) = send_raw(
            app.addr,
            "PATCH",
            "/v1/notifications",
            &[("authorization", &bearer(&reader_token))],
            None,
        )
        .await;
        assert_eq!(status, 200);
        let resp: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(resp.get("success").and_then(Value::as_bool), Some(true));
        assert_eq!(
            resp.get("updated").and_then(Value::as_i64),
            Some(expected_updated)
        );
    }

    let (_, _, body) = send_raw(
        app.addr,
        "GET",
        "/v1/notifications",
        &[("authorization", &bearer(&reader_token))],
        None,
    )
    .await;
    let rows: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert!(rows.iter().all(|r| r.get("seen") == Some(&json!(true))));
}

#[tokio::test]
async fn paid_subscriber_flows_into_the_next_fanout() {
    let app = spawn_app().await;
    let (buyer_token, buyer) = signin(app.addr, "paid@example.com").await;
    let buyer_id = UserId(buyer.get("id").and_then(Value::as_i64).unwrap());
    let (admin_token, _) = signin(app.addr, ADMIN_EMAIL).await;

    // Plan, payment, device registration, all through the API.
    let (status, _, body) = send_raw(
        app.addr,
        "POST",
        "/v1/plans",
        &[("authorization", &bearer(&admin_token))],
        Some(&json!({
            "name": "Equity Pro",
            "price": 999.0,
            "duration": {"magnitude": 1, "unit": "month"},
            "plan_type": "equity"
        })),
    )
    .await;
    assert_eq!(status, 201, "{body}");
    let plan: Value = serde_json::from_str(&body).unwrap();
    let plan_id = plan.get("id").and_then(Value::as_i64).unwrap();

    let (status, _, _) = send_raw(
        app.addr,
        "POST",
        "/v1/payments/verify",
        &[("authorization", &bearer(&buyer_token))],
        Some(&json!({
            "order_id": "order_1",
            "payment_id": "pay_1",
            "signature": sign_payment("order_1", "pay_1"),
            "plan_id": plan_id,
            "amount": 999.0
        })),
    )
    .await;
    assert_eq!(status, 200);

    let (status, _, _) = send_raw(
        app.addr,
        "POST",
        "/v1/profile/push-token",
        &[("authorization", &bearer(&buyer_token))],
        Some(&json!({"push_token": "tok-paid"})),
    )
    .await;
    assert_eq!(status, 200);

    assert_eq!(
        post_tip(app.addr, &admin_token, &tip_payload("equity", "TCS", false)).await,
        201
    );
    assert_eq!(app.push.delivered_to().await, vec!["tok-paid".to_string()]);
    let rows = app.store.notifications_for_user(buyer_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].message, "New equity tip added: TCS");
}
