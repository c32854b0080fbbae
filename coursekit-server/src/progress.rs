//! Lesson completion facts and derived progress summaries
//!
//! Percentages are computed on read from the stored completion set, never
//! cached, so they cannot drift from the facts they summarize.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::enrollment::EnrollmentGate;
use crate::error::PlatformError;
use crate::store::{CatalogStore, EnrollmentStore, LessonProgress, ProgressStore};

/// A user's standing in one course
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressSummary {
    pub course_id: Uuid,
    pub completed_lessons: u32,
    pub total_lessons: u32,
    pub percent: u32,
}

/// Owns per-lesson completion facts; every write is gated on enrollment.
pub struct ProgressAggregator<S> {
    store: Arc<S>,
    gate: EnrollmentGate<S>,
}

impl<S> ProgressAggregator<S>
where
    S: ProgressStore + EnrollmentStore + CatalogStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            gate: EnrollmentGate::new(store.clone()),
            store,
        }
    }

    /// Record (or clear) a lesson completion for a user.
    ///
    /// Idempotent: a repeat completion leaves the row as it was, keeping
    /// the first completion time. A lesson the catalog does not know looks
    /// exactly like one the user is not enrolled for, so probing lesson ids
    /// cannot map the catalog.
    pub fn mark_lesson(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        completed: bool,
    ) -> Result<LessonProgress, PlatformError> {
        let course_id = self
            .store
            .course_of_lesson(lesson_id)?
            .ok_or(PlatformError::NotEnrolled)?;

        if !self.gate.is_enrolled(user_id, course_id)? {
            return Err(PlatformError::NotEnrolled);
        }

        let progress = self.store.upsert_progress(user_id, lesson_id, completed)?;
        tracing::debug!(
            user = %user_id,
            lesson = %lesson_id,
            completed,
            "Lesson progress recorded"
        );
        Ok(progress)
    }

    /// A user's progress through one course, computed from the current
    /// completion set. Requires enrollment.
    pub fn course_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<CourseProgressSummary, PlatformError> {
        if !self.gate.is_enrolled(user_id, course_id)? {
            return Err(PlatformError::NotEnrolled);
        }

        let total_lessons = self.store.lesson_count(course_id)?;
        let completed_lessons = self.store.completed_lessons(user_id, course_id)?;

        Ok(CourseProgressSummary {
            course_id,
            completed_lessons,
            total_lessons,
            percent: percent_complete(completed_lessons, total_lessons),
        })
    }

    /// One summary per course the user is enrolled in
    pub fn user_progress(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CourseProgressSummary>, PlatformError> {
        let mut summaries = Vec::new();
        for enrollment in self.gate.enrollments(user_id)? {
            summaries.push(self.course_progress(user_id, enrollment.course_id)?);
        }
        Ok(summaries)
    }
}

/// Rounded completion percentage. 100 is reserved for a fully completed
/// course: a value that would round up to 100 with lessons remaining
/// reports 99.
fn percent_complete(completed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    if completed >= total {
        return 100;
    }
    let rounded = ((completed as f64 / total as f64) * 100.0).round() as u32;
    rounded.min(99)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_empty_course_is_zero() {
        assert_eq!(percent_complete(0, 0), 0);
    }

    #[test]
    fn test_percent_rounds() {
        assert_eq!(percent_complete(1, 3), 33);
        assert_eq!(percent_complete(2, 3), 67);
        assert_eq!(percent_complete(1, 2), 50);
    }

    #[test]
    fn test_percent_100_only_when_complete() {
        assert_eq!(percent_complete(3, 3), 100);
        // 999/1000 rounds to 100 but must not report complete
        assert_eq!(percent_complete(999, 1000), 99);
        assert_eq!(percent_complete(0, 1), 0);
    }
}
