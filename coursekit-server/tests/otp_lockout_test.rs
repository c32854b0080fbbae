//! Tests for passcode attempt limits

mod common;

use common::create_test_server;
use serde_json::{json, Value};

const PHONE: &str = "+15559876543";

async fn send_and_get_code(
    server: &axum_test::TestServer,
    sender: &common::MockNotificationSender,
) -> String {
    let response = server
        .post("/auth/send-otp")
        .json(&json!({ "phone": PHONE }))
        .await;
    assert_eq!(response.status_code(), 200);
    sender.get_code(PHONE).unwrap()
}

fn guaranteed_wrong(code: &str) -> &'static str {
    if code == "000000" {
        "000001"
    } else {
        "000000"
    }
}

/// Test: five wrong attempts lock the challenge; the correct code no
/// longer works
#[tokio::test]
async fn test_lockout_after_five_wrong_attempts() {
    let (server, sender, _) = create_test_server();

    let code = send_and_get_code(&server, &sender).await;
    let wrong = guaranteed_wrong(&code);

    for _ in 0..5 {
        let response = server
            .post("/auth/verify-otp")
            .json(&json!({ "phone": PHONE, "code": wrong }))
            .await;
        assert_eq!(response.status_code(), 400);
    }

    // Sixth attempt with the correct code still fails
    let response = server
        .post("/auth/verify-otp")
        .json(&json!({ "phone": PHONE, "code": code }))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["reason"], "Too many incorrect attempts");
}

/// Test: the fifth wrong attempt reports the lock, not a plain mismatch
#[tokio::test]
async fn test_fifth_attempt_reports_lock() {
    let (server, sender, _) = create_test_server();

    let code = send_and_get_code(&server, &sender).await;
    let wrong = guaranteed_wrong(&code);

    for _ in 0..4 {
        let response = server
            .post("/auth/verify-otp")
            .json(&json!({ "phone": PHONE, "code": wrong }))
            .await;
        let body: Value = response.json();
        assert_eq!(body["reason"], "Incorrect passcode");
    }

    let response = server
        .post("/auth/verify-otp")
        .json(&json!({ "phone": PHONE, "code": wrong }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["reason"], "Too many incorrect attempts");
}

/// Test: a few misses below the limit do not block the correct code
#[tokio::test]
async fn test_attempts_below_limit_still_verify() {
    let (server, sender, _) = create_test_server();

    let code = send_and_get_code(&server, &sender).await;
    let wrong = guaranteed_wrong(&code);

    for _ in 0..4 {
        server
            .post("/auth/verify-otp")
            .json(&json!({ "phone": PHONE, "code": wrong }))
            .await;
    }

    let response = server
        .post("/auth/verify-otp")
        .json(&json!({ "phone": PHONE, "code": code }))
        .await;
    assert_eq!(response.status_code(), 200);
}

/// Test: a locked phone recovers by requesting a fresh passcode
#[tokio::test]
async fn test_reissue_clears_lockout() {
    let (server, sender, _) = create_test_server();

    let code = send_and_get_code(&server, &sender).await;
    let wrong = guaranteed_wrong(&code);
    for _ in 0..5 {
        server
            .post("/auth/verify-otp")
            .json(&json!({ "phone": PHONE, "code": wrong }))
            .await;
    }

    let fresh_code = send_and_get_code(&server, &sender).await;
    let response = server
        .post("/auth/verify-otp")
        .json(&json!({ "phone": PHONE, "code": fresh_code }))
        .await;
    assert_eq!(response.status_code(), 200);
}
