//! Enrollment records: the authorization boundary for progress writes

use std::sync::Arc;

use uuid::Uuid;

use crate::error::PlatformError;
use crate::store::{CatalogStore, Enrollment, EnrollmentStore};

/// Records and queries the user/course relation. Every progress mutation
/// passes through [`EnrollmentGate::is_enrolled`] first.
pub struct EnrollmentGate<S> {
    store: Arc<S>,
}

impl<S> EnrollmentGate<S>
where
    S: EnrollmentStore + CatalogStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Enroll a user in a course.
    ///
    /// The insert is a single storage operation, so concurrent
    /// double-submission yields exactly one enrollment and one
    /// [`PlatformError::AlreadyEnrolled`].
    pub fn enroll(&self, user_id: Uuid, course_id: Uuid) -> Result<Enrollment, PlatformError> {
        if !self.store.course_exists(course_id)? {
            return Err(PlatformError::CourseNotFound);
        }

        let enrollment = self.store.insert_enrollment(user_id, course_id)?;
        tracing::info!(user = %user_id, course = %course_id, "Enrolled");
        Ok(enrollment)
    }

    /// Whether the user is enrolled in the course
    pub fn is_enrolled(&self, user_id: Uuid, course_id: Uuid) -> Result<bool, PlatformError> {
        self.store.enrollment_exists(user_id, course_id)
    }

    /// All of a user's enrollments, oldest first
    pub fn enrollments(&self, user_id: Uuid) -> Result<Vec<Enrollment>, PlatformError> {
        self.store.enrollments_for_user(user_id)
    }
}
