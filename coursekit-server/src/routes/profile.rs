//! Profile endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::ProfilePatch;
use crate::error::PlatformError;
use crate::notify::NotificationSender;
use crate::state::AppState;
use crate::store::{Identity, PlatformStore};

#[derive(Serialize)]
pub struct UserResponse {
    pub user: Identity,
}

/// GET /auth/me
pub async fn me<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, PlatformError>
where
    S: PlatformStore,
    N: NotificationSender,
{
    let claims = super::bearer_claims(&headers, &state.sessions)?;
    let user = state.auth.me(claims.sub)?;
    Ok(Json(UserResponse { user }))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub is_onboarded: Option<bool>,
}

/// PATCH /auth/profile
pub async fn update_profile<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    headers: HeaderMap,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, PlatformError>
where
    S: PlatformStore,
    N: NotificationSender,
{
    let claims = super::bearer_claims(&headers, &state.sessions)?;
    let user = state.auth.update_profile(
        claims.sub,
        ProfilePatch {
            email: req.email,
            phone: req.phone,
            first_name: req.first_name,
            last_name: req.last_name,
            avatar: req.avatar,
            is_onboarded: req.is_onboarded,
        },
    )?;
    Ok(Json(UserResponse { user }))
}
