//! Authentication endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::RegisterAttrs;
use crate::error::PlatformError;
use crate::notify::NotificationSender;
use crate::state::AppState;
use crate::store::{Identity, PlatformStore};

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Email or phone number
    pub credential: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: Identity,
    pub token: String,
}

/// POST /auth/login
pub async fn login<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, PlatformError>
where
    S: PlatformStore,
    N: NotificationSender,
{
    let (user, token) = state.auth.login_with_password(&req.credential, &req.password)?;
    Ok(Json(AuthResponse { user, token }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// POST /auth/register
pub async fn register<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, PlatformError>
where
    S: PlatformStore,
    N: NotificationSender,
{
    let (user, token) = state.auth.register(RegisterAttrs {
        email: req.email,
        phone: req.phone,
        password: req.password,
        first_name: req.first_name,
        last_name: req.last_name,
    })?;
    Ok(Json(AuthResponse { user, token }))
}

#[derive(Deserialize)]
pub struct SendOtpRequest {
    pub phone: String,
}

#[derive(Serialize)]
pub struct SendOtpResponse {
    pub sent: bool,
    /// False when the provider refused delivery; the challenge is still
    /// live for callers who learn the code out-of-band.
    pub delivered: bool,
}

/// POST /auth/send-otp
pub async fn send_otp<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, PlatformError>
where
    S: PlatformStore,
    N: NotificationSender,
{
    let issued = state.auth.send_otp(&req.phone)?;
    Ok(Json(SendOtpResponse {
        sent: true,
        delivered: issued.delivered,
    }))
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub code: String,
}

/// POST /auth/verify-otp
pub async fn verify_otp<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<AuthResponse>, PlatformError>
where
    S: PlatformStore,
    N: NotificationSender,
{
    let (user, token) = state.auth.complete_otp_login(&req.phone, &req.code)?;
    Ok(Json(AuthResponse { user, token }))
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /auth/refresh
pub async fn refresh<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, PlatformError>
where
    S: PlatformStore,
    N: NotificationSender,
{
    let token = super::bearer_token(&headers)?;
    let token = state.auth.refresh(token)?;
    Ok(Json(RefreshResponse { token }))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /auth/logout
///
/// Sessions are stateless, so there is nothing to revoke server-side; the
/// client discards its token.
pub async fn logout<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, PlatformError>
where
    S: PlatformStore,
    N: NotificationSender,
{
    super::bearer_claims(&headers, &state.sessions)?;
    Ok(Json(LogoutResponse { success: true }))
}
