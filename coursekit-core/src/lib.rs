//! CourseKit session tokens
//!
//! Signed, self-contained credentials asserting a resolved identity for a
//! bounded time window. Validity is purely a function of the signature and
//! the embedded expiry; there is no server-side session state.

pub mod error;
pub mod token;

pub use error::{Error, Result};
pub use token::{SessionClaims, SessionIssuer, SESSION_TTL_DAYS};
