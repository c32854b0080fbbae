//! Tests for account registration

mod common;

use common::{create_test_server, register_user};
use serde_json::{json, Value};

/// Test: register returns the new user and a working token
#[tokio::test]
async fn test_register_returns_user_and_token() {
    let (server, _, _) = create_test_server();

    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": "Alice@Example.COM",
            "password": "testpassword",
            "firstName": "Alice",
            "lastName": "Árnadóttir",
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["firstName"], "Alice");
    assert_eq!(body["user"]["isOnboarded"], false);
    // The password hash never leaves the server
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap();
    let response = server
        .get("/auth/me")
        .add_header(axum::http::header::AUTHORIZATION, common::bearer(token))
        .await;
    assert_eq!(response.status_code(), 200);
}

/// Test: duplicate email is a conflict, first account wins
#[tokio::test]
async fn test_duplicate_email_conflict() {
    let (server, _, _) = create_test_server();

    let (first_id, _) = register_user(&server, "exists@example.com").await;

    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": "exists@example.com",
            "password": "anotherpassword",
        }))
        .await;
    assert_eq!(response.status_code(), 409);
    let body: Value = response.json();
    assert_eq!(body["success"], false);

    // The original account still resolves
    let response = server
        .post("/auth/login")
        .json(&json!({
            "credential": "exists@example.com",
            "password": "testpassword",
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["user"]["id"], first_id.to_string());
}

/// Test: duplicate email detection is case-insensitive
#[tokio::test]
async fn test_duplicate_email_case_insensitive() {
    let (server, _, _) = create_test_server();

    register_user(&server, "case@example.com").await;

    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": "CASE@EXAMPLE.COM",
            "password": "anotherpassword",
        }))
        .await;
    assert_eq!(response.status_code(), 409);
}

/// Test: registering with a phone instead of an email
#[tokio::test]
async fn test_register_with_phone() {
    let (server, _, _) = create_test_server();

    let response = server
        .post("/auth/register")
        .json(&json!({
            "phone": "+1 (555) 123-4567",
            "password": "testpassword",
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["user"]["phone"], "+15551234567");
    assert_eq!(body["user"]["email"], Value::Null);
}

/// Test: exactly one credential channel is required at creation
#[tokio::test]
async fn test_register_requires_one_channel() {
    let (server, _, _) = create_test_server();

    let response = server
        .post("/auth/register")
        .json(&json!({ "password": "testpassword" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": "both@example.com",
            "phone": "+15551234567",
            "password": "testpassword",
        }))
        .await;
    assert_eq!(response.status_code(), 400);
}

/// Test: password length bounds
#[tokio::test]
async fn test_register_password_length() {
    let (server, _, _) = create_test_server();

    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": "short@example.com",
            "password": "short",
        }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": "long@example.com",
            "password": "x".repeat(81),
        }))
        .await;
    assert_eq!(response.status_code(), 400);
}
