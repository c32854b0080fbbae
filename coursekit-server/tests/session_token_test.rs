//! Tests for session token validation and refresh

mod common;

use axum::http::header::AUTHORIZATION;
use chrono::Duration;
use common::{bearer, create_test_server, register_user, TEST_SECRET};
use coursekit_core::SessionIssuer;
use serde_json::Value;
use uuid::Uuid;

/// Test: protected routes reject a missing bearer token
#[tokio::test]
async fn test_missing_token_rejected() {
    let (server, _, _) = create_test_server();

    let response = server.get("/auth/me").await;
    assert_eq!(response.status_code(), 401);

    let response = server.get("/progress").await;
    assert_eq!(response.status_code(), 401);
}

/// Test: garbage and tampered tokens are rejected
#[tokio::test]
async fn test_invalid_token_rejected() {
    let (server, _, _) = create_test_server();
    let (_, token) = register_user(&server, "tamper@example.com").await;

    let response = server
        .get("/auth/me")
        .add_header(AUTHORIZATION, bearer("not-a-token"))
        .await;
    assert_eq!(response.status_code(), 401);

    // Flip the final signature character
    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let response = server
        .get("/auth/me")
        .add_header(AUTHORIZATION, bearer(&tampered))
        .await;
    assert_eq!(response.status_code(), 401);
}

/// Test: a token signed with another secret is rejected
#[tokio::test]
async fn test_foreign_token_rejected() {
    let (server, _, _) = create_test_server();

    let foreign = SessionIssuer::new("some-other-secret")
        .issue(Uuid::new_v4(), Some("evil@example.com"), None)
        .unwrap();

    let response = server
        .get("/auth/me")
        .add_header(AUTHORIZATION, bearer(&foreign))
        .await;
    assert_eq!(response.status_code(), 401);
}

/// Test: an expired token is rejected
#[tokio::test]
async fn test_expired_token_rejected() {
    let (server, _, _) = create_test_server();
    let (user_id, _) = register_user(&server, "expired@example.com").await;

    let expired = SessionIssuer::new(TEST_SECRET)
        .issue_with_ttl(user_id, None, None, Duration::minutes(-5))
        .unwrap();

    let response = server
        .get("/auth/me")
        .add_header(AUTHORIZATION, bearer(&expired))
        .await;
    assert_eq!(response.status_code(), 401);
}

/// Test: refresh returns a fresh, working token
#[tokio::test]
async fn test_refresh_returns_working_token() {
    let (server, _, _) = create_test_server();
    let (user_id, token) = register_user(&server, "refresh@example.com").await;

    let response = server
        .post("/auth/refresh")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let new_token = body["token"].as_str().unwrap();

    let response = server
        .get("/auth/me")
        .add_header(AUTHORIZATION, bearer(new_token))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["user"]["id"], user_id.to_string());
}

/// Test: refresh requires a currently-valid token
#[tokio::test]
async fn test_refresh_rejects_expired_token() {
    let (server, _, _) = create_test_server();
    let (user_id, _) = register_user(&server, "stale@example.com").await;

    let expired = SessionIssuer::new(TEST_SECRET)
        .issue_with_ttl(user_id, None, None, Duration::minutes(-5))
        .unwrap();

    let response = server
        .post("/auth/refresh")
        .add_header(AUTHORIZATION, bearer(&expired))
        .await;
    assert_eq!(response.status_code(), 401);
}

/// Test: logout acknowledges; the token itself stays valid until expiry
#[tokio::test]
async fn test_logout_is_client_side() {
    let (server, _, _) = create_test_server();
    let (_, token) = register_user(&server, "logout@example.com").await;

    let response = server
        .post("/auth/logout")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    // No server-side revocation in this design
    let response = server
        .get("/auth/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(response.status_code(), 200);
}

/// Test: token claims carry the login channel
#[tokio::test]
async fn test_claims_carry_channel() {
    let (server, sender, _) = create_test_server();

    let (_, token) = common::otp_login(&server, &sender, "+15553334444").await;

    let claims = SessionIssuer::new(TEST_SECRET).validate(&token).unwrap();
    assert_eq!(claims.phone.as_deref(), Some("+15553334444"));
    assert_eq!(claims.email, None);
}
