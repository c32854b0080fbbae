//! One-time-passcode challenges
//!
//! A small state machine per phone number: a challenge is pending from
//! issue until it is verified, expires, or runs out of attempts. Expiry is
//! evaluated lazily at verification time; there is no background sweeper,
//! and a stale challenge simply sits in storage until the next issue
//! overwrites it or housekeeping purges it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::crypto::generate_otp_code;
use crate::error::{OtpError, PlatformError};
use crate::notify::NotificationSender;
use crate::store::{ChallengeStore, OtpChallenge};

/// Challenge lifetime
pub const OTP_TTL_MINUTES: i64 = 5;

/// Verification attempts before a challenge locks
pub const OTP_MAX_ATTEMPTS: u32 = 5;

/// Outcome of issuing a challenge
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub expires_at: DateTime<Utc>,
    /// Whether the sender accepted the passcode. A delivery failure leaves
    /// the challenge valid: in mocked environments the caller may still
    /// know the code out-of-band.
    pub delivered: bool,
}

/// Issues and verifies one-time passcodes, one live challenge per phone.
pub struct OtpChallengeManager<S, N> {
    store: Arc<S>,
    sender: Arc<N>,
}

impl<S, N> OtpChallengeManager<S, N>
where
    S: ChallengeStore,
    N: NotificationSender,
{
    pub fn new(store: Arc<S>, sender: Arc<N>) -> Self {
        Self { store, sender }
    }

    /// Issue a fresh challenge for `phone`, discarding any previous one.
    ///
    /// The manager does not rate-limit issuance (callers apply their own
    /// resend cooldown); only verification attempts are bounded.
    pub fn issue(&self, phone: &str) -> Result<IssuedChallenge, PlatformError> {
        let code = generate_otp_code();
        let now = Utc::now();
        let expires_at = now + Duration::minutes(OTP_TTL_MINUTES);

        self.store.put_challenge(OtpChallenge {
            phone: phone.to_string(),
            code: code.clone(),
            issued_at: now,
            expires_at,
            attempts_remaining: OTP_MAX_ATTEMPTS,
            consumed: false,
        })?;

        let delivered = match self.sender.send_otp(phone, &code) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    phone = %phone,
                    error = %e,
                    "Passcode delivery failed; challenge remains valid"
                );
                false
            }
        };

        Ok(IssuedChallenge {
            expires_at,
            delivered,
        })
    }

    /// Verify `code` against the live challenge for `phone`.
    ///
    /// A successful verification consumes the challenge; replaying the same
    /// code afterwards fails. A locked challenge fails fast without
    /// consulting the stored code.
    pub fn verify(&self, phone: &str, code: &str) -> Result<(), PlatformError> {
        let mut challenge = self
            .store
            .get_challenge(phone)?
            .ok_or(OtpError::NotFound)?;

        if challenge.consumed {
            return Err(OtpError::AlreadyUsed.into());
        }
        if challenge.attempts_remaining == 0 {
            return Err(OtpError::Locked.into());
        }
        if Utc::now() > challenge.expires_at {
            return Err(OtpError::Expired.into());
        }

        if challenge.code != code {
            challenge.attempts_remaining -= 1;
            let locked = challenge.attempts_remaining == 0;
            self.store.put_challenge(challenge)?;
            tracing::debug!(phone = %phone, locked, "Passcode mismatch");
            return Err(if locked {
                OtpError::Locked
            } else {
                OtpError::InvalidCode
            }
            .into());
        }

        challenge.consumed = true;
        self.store.put_challenge(challenge)?;

        tracing::info!(phone = %phone, "Passcode verified");
        Ok(())
    }
}
