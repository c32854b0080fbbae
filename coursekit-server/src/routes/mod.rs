//! HTTP routes for the platform engine

mod auth;
mod courses;
mod profile;
mod progress;

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::routing::{get, patch, post};
use axum::Router;
use coursekit_core::{SessionClaims, SessionIssuer};
use tower_http::trace::TraceLayer;

use crate::error::PlatformError;
use crate::notify::NotificationSender;
use crate::state::AppState;
use crate::store::PlatformStore;

/// Create the router with all routes
pub fn create_router<S, N>(state: Arc<AppState<S, N>>) -> Router
where
    S: PlatformStore + 'static,
    N: NotificationSender + 'static,
{
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/send-otp", post(auth::send_otp))
        .route("/auth/verify-otp", post(auth::verify_otp))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(profile::me))
        .route("/auth/profile", patch(profile::update_profile))
        .route("/courses/:id/enroll", post(courses::enroll))
        .route("/progress", get(progress::user_progress))
        .route("/progress/courses/:id", get(progress::course_progress))
        .route("/progress/lessons/:id/complete", post(progress::mark_lesson))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve the bearer token on a request to session claims.
///
/// Missing header, malformed token, bad signature, and expiry all collapse
/// into `NotAuthenticated`; token validation failing is routine and carries
/// no further detail.
pub(crate) fn bearer_claims(
    headers: &HeaderMap,
    sessions: &SessionIssuer,
) -> Result<SessionClaims, PlatformError> {
    let token = bearer_token(headers)?;
    sessions
        .validate(token)
        .ok_or(PlatformError::NotAuthenticated)
}

/// Extract the raw bearer token from the Authorization header
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, PlatformError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(PlatformError::NotAuthenticated)
}
