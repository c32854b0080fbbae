//! Session token issuing and validation
//!
//! A session token is an HMAC-signed JWT carrying the resolved identity's
//! claims. Verification is stateless: signature plus expiry, nothing else.
//! Logout is therefore a client-side discard; there is no revocation list.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// Session lifetime: seven days from issue.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// The identity this session asserts
    pub sub: Uuid,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Creates and validates session tokens with a process-wide secret.
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for an identity, valid for [`SESSION_TTL_DAYS`].
    pub fn issue(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<String> {
        self.issue_with_ttl(user_id, email, phone, Duration::days(SESSION_TTL_DAYS))
    }

    /// Issue a token with an explicit validity window.
    pub fn issue_with_ttl(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        phone: Option<&str>,
        ttl: Duration,
    ) -> Result<String> {
        let now = Utc::now();

        let claims = SessionClaims {
            sub: user_id,
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Validate a token, returning its claims.
    ///
    /// Returns `None` for any malformed token, signature mismatch, or
    /// expired session. Validation failing is routine (sessions expire),
    /// so it is never an error value.
    pub fn validate(&self, token: &str) -> Option<SessionClaims> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .ok()
    }

    /// Exchange a still-valid token for one with a fresh expiry.
    ///
    /// No re-authentication happens here: holding an unexpired token is the
    /// whole proof of identity. Returns `None` if the token is invalid.
    pub fn refresh(&self, token: &str) -> Option<String> {
        let claims = self.validate(token)?;
        self.issue(claims.sub, claims.email.as_deref(), claims.phone.as_deref())
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let issuer = SessionIssuer::new("test_secret_key");
        let user_id = Uuid::new_v4();

        let token = issuer
            .issue(user_id, Some("alice@example.com"), None)
            .unwrap();

        let claims = issuer.validate(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email.as_deref(), Some("alice@example.com"));
        assert_eq!(claims.phone, None);
    }

    #[test]
    fn test_token_has_three_parts() {
        let issuer = SessionIssuer::new("test_secret_key");
        let token = issuer.issue(Uuid::new_v4(), None, Some("+15551234567")).unwrap();

        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_malformed_token_is_invalid() {
        let issuer = SessionIssuer::new("test_secret_key");
        assert!(issuer.validate("not a token").is_none());
        assert!(issuer.validate("").is_none());
        assert!(issuer.validate("a.b.c").is_none());
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let issuer1 = SessionIssuer::new("secret1");
        let issuer2 = SessionIssuer::new("secret2");

        let token = issuer1.issue(Uuid::new_v4(), None, None).unwrap();
        assert!(issuer2.validate(&token).is_none());
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let issuer = SessionIssuer::new("test_secret_key");
        let token = issuer.issue(Uuid::new_v4(), None, None).unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });

        assert!(issuer.validate(&tampered).is_none());
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let issuer = SessionIssuer::new("test_secret_key");
        let token = issuer
            .issue_with_ttl(Uuid::new_v4(), None, None, Duration::minutes(-5))
            .unwrap();

        assert!(issuer.validate(&token).is_none());
    }

    #[test]
    fn test_expiry_window() {
        let issuer = SessionIssuer::new("test_secret_key");
        let token = issuer.issue(Uuid::new_v4(), None, None).unwrap();
        let claims = issuer.validate(&token).unwrap();

        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, SESSION_TTL_DAYS * 24 * 3600);
    }

    #[test]
    fn test_refresh_extends_expiry() {
        let issuer = SessionIssuer::new("test_secret_key");
        let user_id = Uuid::new_v4();

        let short = issuer
            .issue_with_ttl(user_id, Some("alice@example.com"), None, Duration::hours(1))
            .unwrap();
        let refreshed = issuer.refresh(&short).unwrap();

        let old_claims = issuer.validate(&short).unwrap();
        let new_claims = issuer.validate(&refreshed).unwrap();
        assert_eq!(new_claims.sub, user_id);
        assert_eq!(new_claims.email.as_deref(), Some("alice@example.com"));
        assert!(new_claims.exp > old_claims.exp);
    }

    #[test]
    fn test_refresh_rejects_invalid_token() {
        let issuer = SessionIssuer::new("test_secret_key");
        assert!(issuer.refresh("garbage").is_none());

        let expired = issuer
            .issue_with_ttl(Uuid::new_v4(), None, None, Duration::minutes(-5))
            .unwrap();
        assert!(issuer.refresh(&expired).is_none());
    }
}
