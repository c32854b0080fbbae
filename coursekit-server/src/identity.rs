//! Credential classification and normalization
//!
//! A login credential containing `@` is an email; anything else is treated
//! as a phone number. The two channels are disjoint by this rule, so a
//! credential can never resolve to more than one identity kind.

use crate::error::PlatformError;

/// A classified, normalized login credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Credential {
    Email(String),
    Phone(String),
}

impl Credential {
    /// Classify and normalize a raw credential string.
    pub fn parse(raw: &str) -> Result<Self, PlatformError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PlatformError::Validation(
                "credential must not be empty".to_string(),
            ));
        }

        if raw.contains('@') {
            Ok(Credential::Email(normalize_email(raw)?))
        } else {
            Ok(Credential::Phone(normalize_phone(raw)?))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Credential::Email(s) | Credential::Phone(s) => s,
        }
    }
}

/// Lowercase an email address, rejecting obviously malformed ones.
pub fn normalize_email(raw: &str) -> Result<String, PlatformError> {
    let email = raw.trim().to_lowercase();

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| PlatformError::Validation("invalid email address".to_string()))?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return Err(PlatformError::Validation(
            "invalid email address".to_string(),
        ));
    }

    Ok(email)
}

/// Canonicalize a phone number to `+` followed by its digits.
///
/// Separators and a leading `+` are tolerated on input; the stored form is
/// always `+<digits>`, so lookups are format-insensitive.
pub fn normalize_phone(raw: &str) -> Result<String, PlatformError> {
    if raw
        .trim()
        .chars()
        .any(|c| !c.is_ascii_digit() && !matches!(c, '+' | '-' | '(' | ')' | '.' | ' '))
    {
        return Err(PlatformError::Validation(
            "invalid phone number".to_string(),
        ));
    }

    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if !(7..=15).contains(&digits.len()) {
        return Err(PlatformError::Validation(
            "phone number must have 7 to 15 digits".to_string(),
        ));
    }

    Ok(format!("+{digits}"))
}
