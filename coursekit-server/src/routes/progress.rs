//! Progress endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::PlatformError;
use crate::notify::NotificationSender;
use crate::progress::CourseProgressSummary;
use crate::state::AppState;
use crate::store::{LessonProgress, PlatformStore};

#[derive(Deserialize)]
pub struct MarkLessonRequest {
    pub completed: bool,
}

/// POST /progress/lessons/:id/complete
pub async fn mark_lesson<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(lesson_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<MarkLessonRequest>,
) -> Result<Json<LessonProgress>, PlatformError>
where
    S: PlatformStore,
    N: NotificationSender,
{
    let claims = super::bearer_claims(&headers, &state.sessions)?;
    let progress = state
        .progress
        .mark_lesson(claims.sub, lesson_id, req.completed)?;
    Ok(Json(progress))
}

/// GET /progress/courses/:id
pub async fn course_progress<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(course_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<CourseProgressSummary>, PlatformError>
where
    S: PlatformStore,
    N: NotificationSender,
{
    let claims = super::bearer_claims(&headers, &state.sessions)?;
    let summary = state.progress.course_progress(claims.sub, course_id)?;
    Ok(Json(summary))
}

/// GET /progress
pub async fn user_progress<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<CourseProgressSummary>>, PlatformError>
where
    S: PlatformStore,
    N: NotificationSender,
{
    let claims = super::bearer_claims(&headers, &state.sessions)?;
    let summaries = state.progress.user_progress(claims.sub)?;
    Ok(Json(summaries))
}
