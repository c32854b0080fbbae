//! Login, registration, and OTP orchestration
//!
//! The entry point the HTTP layer talks to. Password flows resolve a
//! credential and compare hashes; phone flows run the passcode challenge
//! and then find or create the identity. Either way the outcome is a
//! signed session token.

use std::sync::Arc;

use coursekit_core::SessionIssuer;
use uuid::Uuid;

use crate::crypto::{hash_password, verify_password};
use crate::error::PlatformError;
use crate::identity::{normalize_email, normalize_phone, Credential};
use crate::notify::NotificationSender;
use crate::otp::{IssuedChallenge, OtpChallengeManager};
use crate::store::{ChallengeStore, Identity, IdentityPatch, IdentityStore, NewIdentity};

/// Minimum password length
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length
const MAX_PASSWORD_LENGTH: usize = 80;

/// Attributes for registering a new account
#[derive(Debug, Clone)]
pub struct RegisterAttrs {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Raw profile update, normalized before it reaches the store
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub is_onboarded: Option<bool>,
}

/// Orchestrates the identity store, the passcode challenge manager, and the
/// session issuer into the login/register/verify flows.
pub struct AuthService<S, N> {
    store: Arc<S>,
    otp: OtpChallengeManager<S, N>,
    sessions: Arc<SessionIssuer>,
}

impl<S, N> AuthService<S, N>
where
    S: IdentityStore + ChallengeStore,
    N: NotificationSender,
{
    pub fn new(store: Arc<S>, sender: Arc<N>, sessions: Arc<SessionIssuer>) -> Self {
        Self {
            otp: OtpChallengeManager::new(store.clone(), sender),
            store,
            sessions,
        }
    }

    /// Authenticate with a credential (email or phone) and password.
    ///
    /// An unknown credential and a wrong password are indistinguishable to
    /// the caller.
    pub fn login_with_password(
        &self,
        credential: &str,
        password: &str,
    ) -> Result<(Identity, String), PlatformError> {
        let credential = Credential::parse(credential)?;

        let identity = self
            .store
            .find_by_credential(&credential)?
            .ok_or(PlatformError::InvalidCredentials)?;

        let hash = identity
            .password_hash
            .as_deref()
            .ok_or(PlatformError::InvalidCredentials)?;

        let valid = verify_password(password, hash)
            .map_err(|e| PlatformError::Internal(e.to_string()))?;
        if !valid {
            return Err(PlatformError::InvalidCredentials);
        }

        let token = self.issue_for(&identity)?;
        tracing::info!(user = %identity.id, "Password login");
        Ok((identity, token))
    }

    /// Start a phone login by issuing a passcode challenge
    pub fn send_otp(&self, phone: &str) -> Result<IssuedChallenge, PlatformError> {
        let phone = require_phone(phone)?;
        self.otp.issue(&phone)
    }

    /// Complete a phone login with the delivered passcode.
    ///
    /// A first-time phone user gets a fresh identity with
    /// `is_onboarded = false`; onboarding fills in the rest later.
    pub fn complete_otp_login(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<(Identity, String), PlatformError> {
        let phone = require_phone(phone)?;
        self.otp.verify(&phone, code)?;

        let identity = match self
            .store
            .find_by_credential(&Credential::Phone(phone.clone()))?
        {
            Some(identity) => identity,
            None => {
                let identity = self.store.create_identity(NewIdentity {
                    email: None,
                    phone: Some(phone.clone()),
                    password_hash: None,
                    first_name: String::new(),
                    last_name: String::new(),
                    avatar: None,
                    is_onboarded: false,
                })?;
                tracing::info!(user = %identity.id, "Created identity for first phone login");
                identity
            }
        };

        let token = self.issue_for(&identity)?;
        Ok((identity, token))
    }

    /// Register a new account with exactly one credential channel
    pub fn register(&self, attrs: RegisterAttrs) -> Result<(Identity, String), PlatformError> {
        if attrs.password.len() < MIN_PASSWORD_LENGTH {
            return Err(PlatformError::Validation(
                "password too short (minimum 8 characters)".to_string(),
            ));
        }
        if attrs.password.len() > MAX_PASSWORD_LENGTH {
            return Err(PlatformError::Validation(
                "password too long (maximum 80 characters)".to_string(),
            ));
        }

        let (email, phone) = match (&attrs.email, &attrs.phone) {
            (Some(email), None) => (Some(normalize_email(email)?), None),
            (None, Some(phone)) => (None, Some(normalize_phone(phone)?)),
            _ => {
                return Err(PlatformError::Validation(
                    "exactly one of email or phone is required".to_string(),
                ))
            }
        };

        let password_hash =
            hash_password(&attrs.password).map_err(|e| PlatformError::Internal(e.to_string()))?;

        let identity = self.store.create_identity(NewIdentity {
            email,
            phone,
            password_hash: Some(password_hash),
            first_name: attrs.first_name,
            last_name: attrs.last_name,
            avatar: None,
            is_onboarded: false,
        })?;

        let token = self.issue_for(&identity)?;
        tracing::info!(user = %identity.id, "Registered");
        Ok((identity, token))
    }

    /// Exchange a valid bearer token for one with a fresh expiry
    pub fn refresh(&self, token: &str) -> Result<String, PlatformError> {
        self.sessions
            .refresh(token)
            .ok_or(PlatformError::NotAuthenticated)
    }

    /// The identity behind a validated set of claims
    pub fn me(&self, user_id: Uuid) -> Result<Identity, PlatformError> {
        self.store
            .get_identity(user_id)?
            .ok_or(PlatformError::UserNotFound)
    }

    /// Apply a profile update, normalizing any credential changes first
    pub fn update_profile(
        &self,
        user_id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Identity, PlatformError> {
        let email = patch.email.as_deref().map(normalize_email).transpose()?;
        let phone = patch.phone.as_deref().map(normalize_phone).transpose()?;

        self.store.update_identity(
            user_id,
            IdentityPatch {
                email,
                phone,
                first_name: patch.first_name,
                last_name: patch.last_name,
                avatar: patch.avatar,
                is_onboarded: patch.is_onboarded,
            },
        )
    }

    fn issue_for(&self, identity: &Identity) -> Result<String, PlatformError> {
        self.sessions
            .issue(
                identity.id,
                identity.email.as_deref(),
                identity.phone.as_deref(),
            )
            .map_err(|e| PlatformError::Internal(e.to_string()))
    }
}

fn require_phone(raw: &str) -> Result<String, PlatformError> {
    match Credential::parse(raw)? {
        Credential::Phone(phone) => Ok(phone),
        Credential::Email(_) => Err(PlatformError::Validation(
            "a phone number is required".to_string(),
        )),
    }
}
