//! Storage abstractions for the platform engine
//!
//! Each engine component receives the narrowest capability it needs; one
//! backend type implements them all. Uniqueness guarantees (email/phone,
//! enrollment pairs, lesson-progress pairs) live at this layer, so every
//! race-sensitive write is a single storage operation rather than a
//! check-then-insert pair.

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::MemoryStore;
pub use models::*;
pub use sqlite::SqliteStore;

use uuid::Uuid;

use crate::error::PlatformError;
use crate::identity::Credential;

/// Result type for store operations
pub type StoreResult<T> = Result<T, PlatformError>;

/// Identity persistence with channel uniqueness.
pub trait IdentityStore: Send + Sync {
    /// Insert a new identity as one storage operation. A duplicate email or
    /// phone surfaces the backend's uniqueness constraint as
    /// [`PlatformError::EmailTaken`]/[`PlatformError::PhoneTaken`].
    fn create_identity(&self, attrs: NewIdentity) -> StoreResult<Identity>;

    /// Get an identity by ID
    fn get_identity(&self, id: Uuid) -> StoreResult<Option<Identity>>;

    /// Look up an identity through its normalized credential
    fn find_by_credential(&self, credential: &Credential) -> StoreResult<Option<Identity>>;

    /// Apply a partial update. A patched email/phone that collides with a
    /// *different* identity fails with the matching conflict error.
    fn update_identity(&self, id: Uuid, patch: IdentityPatch) -> StoreResult<Identity>;
}

/// Ephemeral passcode-challenge storage, keyed by phone.
pub trait ChallengeStore: Send + Sync {
    /// Store a challenge, replacing any previous one for the same phone
    fn put_challenge(&self, challenge: OtpChallenge) -> StoreResult<()>;

    /// Get the live challenge for a phone, expired or not
    fn get_challenge(&self, phone: &str) -> StoreResult<Option<OtpChallenge>>;

    /// Remove challenges whose expiry has passed; returns how many went.
    /// Expiry is otherwise evaluated lazily at verification time; this is
    /// for an external housekeeping job, never called by the engine.
    fn purge_expired_challenges(&self) -> StoreResult<u64>;
}

/// Enrollment records: the many-to-many relation between users and courses.
pub trait EnrollmentStore: Send + Sync {
    /// Insert an enrollment as one storage operation. The `(user, course)`
    /// uniqueness constraint resolves concurrent double-submission to
    /// exactly one success and one [`PlatformError::AlreadyEnrolled`].
    fn insert_enrollment(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<Enrollment>;

    /// Whether an enrollment exists for the pair
    fn enrollment_exists(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<bool>;

    /// All enrollments for a user
    fn enrollments_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Enrollment>>;
}

/// Lesson completion facts.
pub trait ProgressStore: Send + Sync {
    /// Upsert the completion fact as one storage operation. A repeat
    /// completion keeps the original `completed_at`; un-completing clears
    /// it.
    fn upsert_progress(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        completed: bool,
    ) -> StoreResult<LessonProgress>;

    /// Get the progress row for a `(user, lesson)` pair
    fn get_progress(&self, user_id: Uuid, lesson_id: Uuid) -> StoreResult<Option<LessonProgress>>;

    /// Count a user's completed lessons within a course
    fn completed_lessons(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<u32>;
}

/// Read-only view of the course catalog.
///
/// Courses and lessons are owned by the content-authoring collaborator; the
/// engine only ever reads them.
pub trait CatalogStore: Send + Sync {
    /// Whether a course exists
    fn course_exists(&self, course_id: Uuid) -> StoreResult<bool>;

    /// The course a lesson belongs to, if the lesson exists
    fn course_of_lesson(&self, lesson_id: Uuid) -> StoreResult<Option<Uuid>>;

    /// Number of lessons in a course
    fn lesson_count(&self, course_id: Uuid) -> StoreResult<u32>;
}

/// A backend that serves every engine component.
pub trait PlatformStore:
    IdentityStore + ChallengeStore + EnrollmentStore + ProgressStore + CatalogStore
{
}

impl<T> PlatformStore for T where
    T: IdentityStore + ChallengeStore + EnrollmentStore + ProgressStore + CatalogStore
{
}
