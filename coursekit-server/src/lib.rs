//! CourseKit platform engine
//!
//! Resolves login credentials to canonical identities across the email and
//! phone channels, runs one-time-passcode challenges for phone logins,
//! issues stateless session tokens, and gates every lesson-progress write
//! behind an enrollment check. Everything else the platform does (content
//! authoring, page rendering, delivery) lives in external collaborators.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod enrollment;
pub mod error;
pub mod identity;
pub mod notify;
pub mod otp;
pub mod progress;
pub mod routes;
pub mod state;
pub mod store;

pub use auth::{AuthService, ProfilePatch, RegisterAttrs};
pub use config::Config;
pub use enrollment::EnrollmentGate;
pub use error::{OtpError, PlatformError};
pub use identity::Credential;
pub use notify::{ConsoleNotificationSender, NotificationSender};
pub use otp::OtpChallengeManager;
pub use progress::{CourseProgressSummary, ProgressAggregator};
pub use state::AppState;
pub use store::{MemoryStore, PlatformStore, SqliteStore};
