//! Platform error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failure modes of a one-time-passcode challenge.
///
/// All map to 400 at the HTTP boundary, with the reason string telling the
/// client which state the challenge is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("No passcode challenge is pending for this phone")]
    NotFound,

    #[error("Passcode expired")]
    Expired,

    #[error("Incorrect passcode")]
    InvalidCode,

    #[error("Too many incorrect attempts")]
    Locked,

    #[error("Passcode already used")]
    AlreadyUsed,
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Not enrolled in this course")]
    NotEnrolled,

    #[error("User not found")]
    UserNotFound,

    #[error("Course not found")]
    CourseNotFound,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Phone number already registered")]
    PhoneTaken,

    #[error("Already enrolled in this course")]
    AlreadyEnrolled,

    #[error(transparent)]
    Otp(#[from] OtpError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            PlatformError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            PlatformError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials")
            }
            PlatformError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated"),
            PlatformError::NotEnrolled => (StatusCode::FORBIDDEN, "Not enrolled in this course"),
            PlatformError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            PlatformError::CourseNotFound => (StatusCode::NOT_FOUND, "Course not found"),
            PlatformError::EmailTaken => (StatusCode::CONFLICT, "Email already registered"),
            PlatformError::PhoneTaken => {
                (StatusCode::CONFLICT, "Phone number already registered")
            }
            PlatformError::AlreadyEnrolled => {
                (StatusCode::CONFLICT, "Already enrolled in this course")
            }
            PlatformError::Otp(otp) => {
                let message = match otp {
                    OtpError::NotFound => "No passcode challenge is pending for this phone",
                    OtpError::Expired => "Passcode expired",
                    OtpError::InvalidCode => "Incorrect passcode",
                    OtpError::Locked => "Too many incorrect attempts",
                    OtpError::AlreadyUsed => "Passcode already used",
                };
                (StatusCode::BAD_REQUEST, message)
            }
            PlatformError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "success": false, "reason": message });
        (status, axum::Json(body)).into_response()
    }
}
