//! Common test utilities for platform integration tests
#![allow(dead_code)]

use std::sync::{Arc, RwLock};

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderValue;
use axum_test::TestServer;
use coursekit_core::SessionIssuer;
use coursekit_server::{routes, AppState, MemoryStore, NotificationSender};
use serde_json::{json, Value};
use uuid::Uuid;

/// Token secret shared with tests that mint their own tokens
pub const TEST_SECRET: &str = "test-secret";

/// Mock sender that captures passcodes
#[derive(Default, Clone)]
pub struct MockNotificationSender {
    /// Captured (phone, code) pairs
    pub sent: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get the last passcode sent to a phone
    pub fn get_code(&self, phone: &str) -> Option<String> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|(p, _)| p == phone)
            .map(|(_, c)| c.clone())
    }
}

impl NotificationSender for MockNotificationSender {
    fn send_otp(&self, phone: &str, code: &str) -> Result<(), String> {
        self.sent
            .write()
            .unwrap()
            .push((phone.to_string(), code.to_string()));
        Ok(())
    }
}

/// Create a test server over the in-memory store with a mock sender.
///
/// The store handle is returned so tests can seed the course catalog and
/// poke at challenge expiry.
pub fn create_test_server() -> (TestServer, MockNotificationSender, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let sender = MockNotificationSender::new();

    let state = Arc::new(AppState::new(
        store.clone(),
        Arc::new(sender.clone()),
        SessionIssuer::new(TEST_SECRET),
    ));

    let app = routes::create_router(state);
    let server = TestServer::new(app).expect("Failed to create test server");

    (server, sender, store)
}

/// Authorization header value for a bearer token
pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

/// Register a password account and return (user id, token)
pub async fn register_user(server: &TestServer, email: &str) -> (Uuid, String) {
    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": email,
            "password": "testpassword",
            "firstName": "Test",
            "lastName": "User",
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let user_id = Uuid::parse_str(body["user"]["id"].as_str().unwrap()).unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    (user_id, token)
}

/// Run the full OTP login flow for a phone and return (user id, token)
pub async fn otp_login(
    server: &TestServer,
    sender: &MockNotificationSender,
    phone: &str,
) -> (Uuid, String) {
    let response = server
        .post("/auth/send-otp")
        .json(&json!({ "phone": phone }))
        .await;
    assert_eq!(response.status_code(), 200);

    let code = sender.get_code(phone).expect("No passcode sent");

    let response = server
        .post("/auth/verify-otp")
        .json(&json!({ "phone": phone, "code": code }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let user_id = Uuid::parse_str(body["user"]["id"].as_str().unwrap()).unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    (user_id, token)
}

/// Enroll the bearer of `token` in a course
pub async fn enroll(server: &TestServer, token: &str, course_id: Uuid) {
    let response = server
        .post(&format!("/courses/{course_id}/enroll"))
        .add_header(AUTHORIZATION, bearer(token))
        .await;
    assert_eq!(response.status_code(), 200);
}
