//! In-memory storage implementation
//!
//! The default backend for tests and local development. Each race-sensitive
//! operation holds a single write guard for its whole check-and-insert, so
//! two concurrent identical requests resolve the same way the SQLite
//! constraints resolve them.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    CatalogStore, ChallengeStore, Enrollment, EnrollmentStore, Identity, IdentityPatch,
    IdentityStore, LessonProgress, NewIdentity, OtpChallenge, ProgressStore, StoreResult,
};
use crate::error::PlatformError;
use crate::identity::Credential;

/// In-memory store implementing every engine capability
pub struct MemoryStore {
    identities: RwLock<HashMap<Uuid, Identity>>,
    challenges: RwLock<HashMap<String, OtpChallenge>>,
    enrollments: RwLock<HashMap<(Uuid, Uuid), Enrollment>>,
    progress: RwLock<HashMap<(Uuid, Uuid), LessonProgress>>,
    /// lesson id -> owning course id
    lessons: RwLock<HashMap<Uuid, Uuid>>,
    /// course id -> lesson ids in order
    courses: RwLock<HashMap<Uuid, Vec<Uuid>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            identities: RwLock::new(HashMap::new()),
            challenges: RwLock::new(HashMap::new()),
            enrollments: RwLock::new(HashMap::new()),
            progress: RwLock::new(HashMap::new()),
            lessons: RwLock::new(HashMap::new()),
            courses: RwLock::new(HashMap::new()),
        }
    }

    /// Seed a course with `lesson_count` lessons, returning the course id
    /// and the lesson ids in order. The engine treats the catalog as
    /// read-only; this stands in for the content-authoring collaborator.
    pub fn seed_course(&self, lesson_count: usize) -> (Uuid, Vec<Uuid>) {
        let course_id = Uuid::new_v4();
        let lesson_ids: Vec<Uuid> = (0..lesson_count).map(|_| Uuid::new_v4()).collect();

        let mut lessons = self.lessons.write().unwrap();
        for lesson_id in &lesson_ids {
            lessons.insert(*lesson_id, course_id);
        }
        self.courses
            .write()
            .unwrap()
            .insert(course_id, lesson_ids.clone());

        (course_id, lesson_ids)
    }

    /// Rewrite the expiry of the live challenge for `phone` (for testing
    /// expiry paths without waiting out the TTL)
    pub fn backdate_challenge(
        &self,
        phone: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut challenges = self.challenges.write().unwrap();
        match challenges.get_mut(phone) {
            Some(challenge) => {
                challenge.expires_at = expires_at;
                Ok(())
            }
            None => Err(PlatformError::Otp(crate::error::OtpError::NotFound)),
        }
    }

    fn conflict_with_other(
        identities: &HashMap<Uuid, Identity>,
        id: Option<Uuid>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Option<PlatformError> {
        for other in identities.values() {
            if Some(other.id) == id {
                continue;
            }
            if email.is_some() && other.email.as_deref() == email {
                return Some(PlatformError::EmailTaken);
            }
            if phone.is_some() && other.phone.as_deref() == phone {
                return Some(PlatformError::PhoneTaken);
            }
        }
        None
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityStore for MemoryStore {
    fn create_identity(&self, attrs: NewIdentity) -> StoreResult<Identity> {
        let mut identities = self.identities.write().unwrap();

        if let Some(err) = Self::conflict_with_other(
            &identities,
            None,
            attrs.email.as_deref(),
            attrs.phone.as_deref(),
        ) {
            return Err(err);
        }

        let now = Utc::now();
        let identity = Identity {
            id: Uuid::new_v4(),
            email: attrs.email,
            phone: attrs.phone,
            password_hash: attrs.password_hash,
            first_name: attrs.first_name,
            last_name: attrs.last_name,
            avatar: attrs.avatar,
            is_onboarded: attrs.is_onboarded,
            created_at: now,
            updated_at: now,
        };
        identities.insert(identity.id, identity.clone());

        Ok(identity)
    }

    fn get_identity(&self, id: Uuid) -> StoreResult<Option<Identity>> {
        Ok(self.identities.read().unwrap().get(&id).cloned())
    }

    fn find_by_credential(&self, credential: &Credential) -> StoreResult<Option<Identity>> {
        let identities = self.identities.read().unwrap();
        let found = identities.values().find(|identity| match credential {
            Credential::Email(email) => identity.email.as_deref() == Some(email),
            Credential::Phone(phone) => identity.phone.as_deref() == Some(phone),
        });
        Ok(found.cloned())
    }

    fn update_identity(&self, id: Uuid, patch: IdentityPatch) -> StoreResult<Identity> {
        let mut identities = self.identities.write().unwrap();

        if let Some(err) = Self::conflict_with_other(
            &identities,
            Some(id),
            patch.email.as_deref(),
            patch.phone.as_deref(),
        ) {
            return Err(err);
        }

        let identity = identities
            .get_mut(&id)
            .ok_or(PlatformError::UserNotFound)?;

        if let Some(email) = patch.email {
            identity.email = Some(email);
        }
        if let Some(phone) = patch.phone {
            identity.phone = Some(phone);
        }
        if let Some(first_name) = patch.first_name {
            identity.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            identity.last_name = last_name;
        }
        if let Some(avatar) = patch.avatar {
            identity.avatar = Some(avatar);
        }
        if let Some(is_onboarded) = patch.is_onboarded {
            identity.is_onboarded = is_onboarded;
        }
        identity.updated_at = Utc::now();

        Ok(identity.clone())
    }
}

impl ChallengeStore for MemoryStore {
    fn put_challenge(&self, challenge: OtpChallenge) -> StoreResult<()> {
        self.challenges
            .write()
            .unwrap()
            .insert(challenge.phone.clone(), challenge);
        Ok(())
    }

    fn get_challenge(&self, phone: &str) -> StoreResult<Option<OtpChallenge>> {
        Ok(self.challenges.read().unwrap().get(phone).cloned())
    }

    fn purge_expired_challenges(&self) -> StoreResult<u64> {
        let now = Utc::now();
        let mut challenges = self.challenges.write().unwrap();
        let before = challenges.len();
        challenges.retain(|_, c| c.expires_at > now);
        Ok((before - challenges.len()) as u64)
    }
}

impl EnrollmentStore for MemoryStore {
    fn insert_enrollment(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<Enrollment> {
        let mut enrollments = self.enrollments.write().unwrap();
        if enrollments.contains_key(&(user_id, course_id)) {
            return Err(PlatformError::AlreadyEnrolled);
        }

        let enrollment = Enrollment {
            user_id,
            course_id,
            enrolled_at: Utc::now(),
        };
        enrollments.insert((user_id, course_id), enrollment.clone());

        Ok(enrollment)
    }

    fn enrollment_exists(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .enrollments
            .read()
            .unwrap()
            .contains_key(&(user_id, course_id)))
    }

    fn enrollments_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Enrollment>> {
        let enrollments = self.enrollments.read().unwrap();
        let mut found: Vec<Enrollment> = enrollments
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.enrolled_at);
        Ok(found)
    }
}

impl ProgressStore for MemoryStore {
    fn upsert_progress(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        completed: bool,
    ) -> StoreResult<LessonProgress> {
        let mut progress = self.progress.write().unwrap();
        let entry = progress
            .entry((user_id, lesson_id))
            .or_insert_with(|| LessonProgress {
                user_id,
                lesson_id,
                completed: false,
                completed_at: None,
            });

        entry.completed = completed;
        if completed {
            // First completion time wins on repeats
            entry.completed_at.get_or_insert_with(Utc::now);
        } else {
            entry.completed_at = None;
        }

        Ok(entry.clone())
    }

    fn get_progress(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
    ) -> StoreResult<Option<LessonProgress>> {
        Ok(self
            .progress
            .read()
            .unwrap()
            .get(&(user_id, lesson_id))
            .cloned())
    }

    fn completed_lessons(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<u32> {
        let lessons = self.lessons.read().unwrap();
        let progress = self.progress.read().unwrap();

        let count = progress
            .values()
            .filter(|p| {
                p.user_id == user_id
                    && p.completed
                    && lessons.get(&p.lesson_id) == Some(&course_id)
            })
            .count();

        Ok(count as u32)
    }
}

impl CatalogStore for MemoryStore {
    fn course_exists(&self, course_id: Uuid) -> StoreResult<bool> {
        Ok(self.courses.read().unwrap().contains_key(&course_id))
    }

    fn course_of_lesson(&self, lesson_id: Uuid) -> StoreResult<Option<Uuid>> {
        Ok(self.lessons.read().unwrap().get(&lesson_id).copied())
    }

    fn lesson_count(&self, course_id: Uuid) -> StoreResult<u32> {
        Ok(self
            .courses
            .read()
            .unwrap()
            .get(&course_id)
            .map(|lessons| lessons.len() as u32)
            .unwrap_or(0))
    }
}
