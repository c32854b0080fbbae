//! SQLite-based storage implementation
//!
//! All cross-request coordination lives in this schema's constraints:
//! unique email/phone columns, the `(user, course)` enrollment primary key,
//! and the `(user, lesson)` progress primary key. Race-sensitive writes are
//! single statements so concurrent duplicates resolve to one success plus
//! one conflict, never two rows.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{
    CatalogStore, ChallengeStore, Enrollment, EnrollmentStore, Identity, IdentityPatch,
    IdentityStore, LessonProgress, NewIdentity, OtpChallenge, ProgressStore, StoreResult,
};
use crate::error::PlatformError;
use crate::identity::Credential;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite store implementing every engine capability
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, PlatformError> {
        let conn = Connection::open(path).map_err(internal)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(internal)?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), PlatformError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(internal)?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, PlatformError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(internal)?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(internal)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), PlatformError> {
        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Canonical user identities; each channel value is globally unique
            CREATE TABLE IF NOT EXISTS identities (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE,
                phone TEXT UNIQUE,
                password_hash TEXT,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                avatar TEXT,
                is_onboarded INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Course catalog (owned by the content collaborator, read-only here)
            CREATE TABLE IF NOT EXISTS courses (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS lessons (
                id TEXT PRIMARY KEY,
                course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                UNIQUE (course_id, position)
            );
            CREATE INDEX IF NOT EXISTS idx_lessons_course ON lessons(course_id);

            -- Enrollments, unique on (user, course)
            CREATE TABLE IF NOT EXISTS enrollments (
                user_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
                course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
                enrolled_at TEXT NOT NULL,
                PRIMARY KEY (user_id, course_id)
            );

            -- Lesson completion facts, unique on (user, lesson)
            CREATE TABLE IF NOT EXISTS lesson_progress (
                user_id TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
                lesson_id TEXT NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
                completed INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                PRIMARY KEY (user_id, lesson_id)
            );

            -- Ephemeral passcode challenges, one live row per phone
            CREATE TABLE IF NOT EXISTS otp_challenges (
                phone TEXT PRIMARY KEY,
                code TEXT NOT NULL,
                issued_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                attempts_remaining INTEGER NOT NULL,
                consumed INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .map_err(internal)?;

        Ok(())
    }

    /// Seed a course with `lesson_count` lessons (test/ops helper; the
    /// engine never writes the catalog)
    pub fn seed_course(
        &self,
        title: &str,
        lesson_count: usize,
    ) -> StoreResult<(Uuid, Vec<Uuid>)> {
        let conn = self.conn.lock().unwrap();
        let course_id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO courses (id, title) VALUES (?1, ?2)",
            params![course_id.to_string(), title],
        )
        .map_err(internal)?;

        let mut lesson_ids = Vec::with_capacity(lesson_count);
        for position in 0..lesson_count {
            let lesson_id = Uuid::new_v4();
            conn.execute(
                "INSERT INTO lessons (id, course_id, position) VALUES (?1, ?2, ?3)",
                params![lesson_id.to_string(), course_id.to_string(), position as i64],
            )
            .map_err(internal)?;
            lesson_ids.push(lesson_id);
        }

        Ok((course_id, lesson_ids))
    }

    fn identity_from_row(row: &Row) -> rusqlite::Result<Identity> {
        let id: String = row.get(0)?;
        let email: Option<String> = row.get(1)?;
        let phone: Option<String> = row.get(2)?;
        let password_hash: Option<String> = row.get(3)?;
        let first_name: String = row.get(4)?;
        let last_name: String = row.get(5)?;
        let avatar: Option<String> = row.get(6)?;
        let is_onboarded: i32 = row.get(7)?;
        let created_at: String = row.get(8)?;
        let updated_at: String = row.get(9)?;

        Ok(Identity {
            id: Uuid::parse_str(&id).unwrap_or_default(),
            email,
            phone,
            password_hash,
            first_name,
            last_name,
            avatar,
            is_onboarded: is_onboarded != 0,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }
}

const IDENTITY_COLUMNS: &str = "id, email, phone, password_hash, first_name, last_name, avatar, is_onboarded, created_at, updated_at";

fn internal(e: rusqlite::Error) -> PlatformError {
    PlatformError::Internal(e.to_string())
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Map a uniqueness violation on the identities table to the channel that
/// collided; anything else is internal.
fn map_identity_conflict(e: rusqlite::Error) -> PlatformError {
    if let rusqlite::Error::SqliteFailure(ref err, ref msg) = e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            let msg = msg.as_deref().unwrap_or("");
            if msg.contains("identities.email") {
                return PlatformError::EmailTaken;
            }
            if msg.contains("identities.phone") {
                return PlatformError::PhoneTaken;
            }
        }
    }
    internal(e)
}

impl IdentityStore for SqliteStore {
    fn create_identity(&self, attrs: NewIdentity) -> StoreResult<Identity> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO identities (id, email, phone, password_hash, first_name, last_name, avatar, is_onboarded, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id.to_string(),
                attrs.email,
                attrs.phone,
                attrs.password_hash,
                attrs.first_name,
                attrs.last_name,
                attrs.avatar,
                attrs.is_onboarded as i32,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(map_identity_conflict)?;

        Ok(Identity {
            id,
            email: attrs.email,
            phone: attrs.phone,
            password_hash: attrs.password_hash,
            first_name: attrs.first_name,
            last_name: attrs.last_name,
            avatar: attrs.avatar,
            is_onboarded: attrs.is_onboarded,
            created_at: now,
            updated_at: now,
        })
    }

    fn get_identity(&self, id: Uuid) -> StoreResult<Option<Identity>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ?1"),
            params![id.to_string()],
            Self::identity_from_row,
        )
        .optional()
        .map_err(internal)
    }

    fn find_by_credential(&self, credential: &Credential) -> StoreResult<Option<Identity>> {
        let conn = self.conn.lock().unwrap();

        let (column, value) = match credential {
            Credential::Email(email) => ("email", email),
            Credential::Phone(phone) => ("phone", phone),
        };

        conn.query_row(
            &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE {column} = ?1"),
            params![value],
            Self::identity_from_row,
        )
        .optional()
        .map_err(internal)
    }

    fn update_identity(&self, id: Uuid, patch: IdentityPatch) -> StoreResult<Identity> {
        let conn = self.conn.lock().unwrap();

        let mut identity = conn
            .query_row(
                &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ?1"),
                params![id.to_string()],
                Self::identity_from_row,
            )
            .optional()
            .map_err(internal)?
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

        conn.execute(
            "UPDATE identities SET email = ?1, phone = ?2, first_name = ?3, last_name = ?4, avatar = ?5, is_onboarded = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                identity.email,
                identity.phone,
                identity.first_name,
                identity.last_name,
                identity.avatar,
                identity.is_onboarded as i32,
                identity.updated_at.to_rfc3339(),
                id.to_string(),
            ],
        )
        .map_err(map_identity_conflict)?;

        Ok(identity)
    }
}

impl ChallengeStore for SqliteStore {
    fn put_challenge(&self, challenge: OtpChallenge) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT OR REPLACE INTO otp_challenges (phone, code, issued_at, expires_at, attempts_remaining, consumed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                challenge.phone,
                challenge.code,
                challenge.issued_at.to_rfc3339(),
                challenge.expires_at.to_rfc3339(),
                challenge.attempts_remaining as i64,
                challenge.consumed as i32,
            ],
        )
        .map_err(internal)?;

        Ok(())
    }

    fn get_challenge(&self, phone: &str) -> StoreResult<Option<OtpChallenge>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT phone, code, issued_at, expires_at, attempts_remaining, consumed
             FROM otp_challenges WHERE phone = ?1",
            params![phone],
            |row| {
                let phone: String = row.get(0)?;
                let code: String = row.get(1)?;
                let issued_at: String = row.get(2)?;
                let expires_at: String = row.get(3)?;
                let attempts_remaining: i64 = row.get(4)?;
                let consumed: i32 = row.get(5)?;
                Ok(OtpChallenge {
                    phone,
                    code,
                    issued_at: parse_timestamp(&issued_at),
                    expires_at: parse_timestamp(&expires_at),
                    attempts_remaining: attempts_remaining.max(0) as u32,
                    consumed: consumed != 0,
                })
            },
        )
        .optional()
        .map_err(internal)
    }

    fn purge_expired_challenges(&self) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();

        let rows_deleted = conn
            .execute(
                "DELETE FROM otp_challenges WHERE expires_at < ?1",
                params![Utc::now().to_rfc3339()],
            )
            .map_err(internal)?;

        Ok(rows_deleted as u64)
    }
}

impl EnrollmentStore for SqliteStore {
    fn insert_enrollment(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<Enrollment> {
        let conn = self.conn.lock().unwrap();
        let enrolled_at = Utc::now();

        conn.execute(
            "INSERT INTO enrollments (user_id, course_id, enrolled_at) VALUES (?1, ?2, ?3)",
            params![
                user_id.to_string(),
                course_id.to_string(),
                enrolled_at.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, ref msg) = e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation
                    && msg.as_deref().unwrap_or("").contains("UNIQUE")
                {
                    return PlatformError::AlreadyEnrolled;
                }
            }
            internal(e)
        })?;

        Ok(Enrollment {
            user_id,
            course_id,
            enrolled_at,
        })
    }

    fn enrollment_exists(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE user_id = ?1 AND course_id = ?2)",
            params![user_id.to_string(), course_id.to_string()],
            |row| row.get(0),
        )
        .map_err(internal)
    }

    fn enrollments_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Enrollment>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT user_id, course_id, enrolled_at FROM enrollments
                 WHERE user_id = ?1 ORDER BY enrolled_at",
            )
            .map_err(internal)?;

        let enrollments = stmt
            .query_map(params![user_id.to_string()], |row| {
                let user_id: String = row.get(0)?;
                let course_id: String = row.get(1)?;
                let enrolled_at: String = row.get(2)?;
                Ok(Enrollment {
                    user_id: Uuid::parse_str(&user_id).unwrap_or_default(),
                    course_id: Uuid::parse_str(&course_id).unwrap_or_default(),
                    enrolled_at: parse_timestamp(&enrolled_at),
                })
            })
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(enrollments)
    }
}

impl ProgressStore for SqliteStore {
    fn upsert_progress(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        completed: bool,
    ) -> StoreResult<LessonProgress> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        // One statement: on repeat completion COALESCE keeps the original
        // completed_at; un-completing clears it.
        conn.execute(
            "INSERT INTO lesson_progress (user_id, lesson_id, completed, completed_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                 completed = excluded.completed,
                 completed_at = CASE
                     WHEN excluded.completed = 1
                         THEN COALESCE(lesson_progress.completed_at, excluded.completed_at)
                     ELSE NULL
                 END",
            params![
                user_id.to_string(),
                lesson_id.to_string(),
                completed as i32,
                if completed { Some(now.to_rfc3339()) } else { None },
            ],
        )
        .map_err(internal)?;

        conn.query_row(
            "SELECT user_id, lesson_id, completed, completed_at FROM lesson_progress
             WHERE user_id = ?1 AND lesson_id = ?2",
            params![user_id.to_string(), lesson_id.to_string()],
            progress_from_row,
        )
        .map_err(internal)
    }

    fn get_progress(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
    ) -> StoreResult<Option<LessonProgress>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT user_id, lesson_id, completed, completed_at FROM lesson_progress
             WHERE user_id = ?1 AND lesson_id = ?2",
            params![user_id.to_string(), lesson_id.to_string()],
            progress_from_row,
        )
        .optional()
        .map_err(internal)
    }

    fn completed_lessons(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<u32> {
        let conn = self.conn.lock().unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM lesson_progress p
                 JOIN lessons l ON l.id = p.lesson_id
                 WHERE p.user_id = ?1 AND l.course_id = ?2 AND p.completed = 1",
                params![user_id.to_string(), course_id.to_string()],
                |row| row.get(0),
            )
            .map_err(internal)?;

        Ok(count as u32)
    }
}

fn progress_from_row(row: &Row) -> rusqlite::Result<LessonProgress> {
    let user_id: String = row.get(0)?;
    let lesson_id: String = row.get(1)?;
    let completed: i32 = row.get(2)?;
    let completed_at: Option<String> = row.get(3)?;
    Ok(LessonProgress {
        user_id: Uuid::parse_str(&user_id).unwrap_or_default(),
        lesson_id: Uuid::parse_str(&lesson_id).unwrap_or_default(),
        completed: completed != 0,
        completed_at: completed_at.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        }),
    })
}

impl CatalogStore for SqliteStore {
    fn course_exists(&self, course_id: Uuid) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM courses WHERE id = ?1)",
            params![course_id.to_string()],
            |row| row.get(0),
        )
        .map_err(internal)
    }

    fn course_of_lesson(&self, lesson_id: Uuid) -> StoreResult<Option<Uuid>> {
        let conn = self.conn.lock().unwrap();

        let course_id: Option<String> = conn
            .query_row(
                "SELECT course_id FROM lessons WHERE id = ?1",
                params![lesson_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(internal)?;

        Ok(course_id.and_then(|s| Uuid::parse_str(&s).ok()))
    }

    fn lesson_count(&self, course_id: Uuid) -> StoreResult<u32> {
        let conn = self.conn.lock().unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM lessons WHERE course_id = ?1",
                params![course_id.to_string()],
                |row| row.get(0),
            )
            .map_err(internal)?;

        Ok(count as u32)
    }
}
