//! Enrollment endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::error::PlatformError;
use crate::notify::NotificationSender;
use crate::state::AppState;
use crate::store::PlatformStore;

#[derive(Serialize)]
pub struct EnrollResponse {
    pub enrolled: bool,
}

/// POST /courses/:id/enroll
pub async fn enroll<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(course_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<EnrollResponse>, PlatformError>
where
    S: PlatformStore,
    N: NotificationSender,
{
    let claims = super::bearer_claims(&headers, &state.sessions)?;
    state.enrollments.enroll(claims.sub, course_id)?;
    Ok(Json(EnrollResponse { enrolled: true }))
}
