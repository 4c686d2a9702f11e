// SPDX-License-Identifier: Apache-2.0

// Each integration binary pulls in the helpers it needs.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use serde_json::{json, Value};
use tipline_server::fakes::{RecordingPushGateway, StaticOtpVerifier, StaticPaymentGateway};
use tipline_server::{build_router, ApiConfig, AppState, PushGateway};
use tipline_store::Store;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PAYMENT_SECRET: &str = "test-payment-secret";

pub struct TestApp {
    pub addr: SocketAddr,
    pub store: Arc<Store>,
    pub push: Arc<RecordingPushGateway>,
}

pub fn test_config() -> ApiConfig {
    ApiConfig {
        admin_email: ADMIN_EMAIL.to_string(),
        payment_secret: PAYMENT_SECRET.to_string(),
        session_secret: "test-session-secret".to_string(),
        push_app_id: "app-test".to_string(),
        ..ApiConfig::default()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(StaticPaymentGateway::default(), RecordingPushGateway::default()).await
}

pub async fn spawn_app_with(
    payment: StaticPaymentGateway,
    push: RecordingPushGateway,
) -> TestApp {
    spawn_app_with_config(payment, push, test_config()).await
}

pub async fn spawn_app_with_config(
    payment: StaticPaymentGateway,
    push: RecordingPushGateway,
    api: ApiConfig,
) -> TestApp {
    let store = Arc::new(Store::open_in_memory().expect("open store"));
    let push = Arc::new(push);
    let push_dyn: Arc<dyn PushGateway> = push.clone();
    let state = AppState::new(
        store.clone(),
        api,
        Arc::new(payment),
        push_dyn,
        Arc::new(StaticOtpVerifier::default()),
    );
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    TestApp { addr, store, push }
}

pub async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&Value>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let payload = body.map(|b| b.to_string()).unwrap_or_default();
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    if body.is_some() {
        req.push_str("content-type: application/json\r\n");
    }
    req.push_str(&format!("content-length: {}\r\n\r\n{payload}", payload.len()));
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_string(), body.to_string())
}

/// Signs in and returns `(token, user json)`.
pub async fn signin(addr: SocketAddr, email: &str) -> (String, Value) {
    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/auth/signin",
        &[],
        Some(&json!({"email": email})),
    )
    .await;
    assert_eq!(status, 200, "signin failed: {body}");
    let json: Value = serde_json::from_str(&body).expect("signin json");
    let token = json
        .get("token")
        .and_then(Value::as_str)
        .expect("token")
        .to_string();
    (token, json.get("user").cloned().expect("user"))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// The signature the payment gateway would produce for this order.
pub fn sign_payment(order_id: &str, payment_id: &str) -> String {
    tipline_server::payments::expected_signature(PAYMENT_SECRET, order_id, payment_id)
}
