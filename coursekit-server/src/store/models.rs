//! Data models for platform storage

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The canonical user record, addressable by email and/or phone.
///
/// Exactly one channel is present at creation; both may coexist after a
/// profile update, and each non-null value is globally unique.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub is_onboarded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes for creating a new identity.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub is_onboarded: bool,
}

/// Partial update to an identity. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct IdentityPatch {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub is_onboarded: Option<bool>,
}

/// A one-time-passcode challenge for a phone identity.
///
/// Ephemeral and TTL-bounded: at most one live challenge per phone, and a
/// new issue replaces whatever was there before.
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    pub phone: String,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub attempts_remaining: u32,
    pub consumed: bool,
}

/// The record granting a user access to a course.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
}

/// Per-user, per-lesson completion fact.
///
/// `completed_at` is set iff `completed` and never regresses to null on a
/// repeat completion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}
