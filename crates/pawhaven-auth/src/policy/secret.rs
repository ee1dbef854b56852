//! One-time secrets: generation, hashing at rest, and comparison.
//!
//! Raw values leave this module exactly once, inside an [`IssuedSecret`],
//! so they can be handed to a delivery channel. Accounts only ever store
//! the SHA-256 digest.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use pawhaven_core::config::AuthConfig;
use pawhaven_entity::secret::ExpiringSecret;

use crate::error::{AuthError, AuthResult};

/// Alphabet for short codes a person retypes from an email.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Alphabet for long tokens. Drops `0 O 1 l I`.
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";

fn random_string(alphabet: &[u8], length: usize) -> String {
    assert!(length > 0, "secret length must be at least 1");
    let mut rng = OsRng;
    (0..length)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

/// Uppercase alphanumeric code from the OS CSPRNG.
pub fn generate_verification_code(length: usize) -> String {
    random_string(CODE_ALPHABET, length)
}

/// Mixed-case token over an unambiguous alphabet, from the OS CSPRNG.
pub fn generate_token(length: usize) -> String {
    random_string(TOKEN_ALPHABET, length)
}

/// Lowercase hex SHA-256 of a raw secret.
pub fn token_digest(raw: &str) -> String {
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

/// Constant-time equality of two digests.
pub fn digests_match(stored: &str, candidate: &str) -> bool {
    constant_time_eq::constant_time_eq(stored.as_bytes(), candidate.as_bytes())
}

/// Result of checking a supplied secret against the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretCheck {
    /// Matches and has not expired.
    Valid,
    /// Matches but the expiry has passed.
    Expired,
    /// A secret is pending but the supplied value is different.
    Mismatch,
    /// Nothing pending (never issued, or already consumed).
    Missing,
}

impl SecretCheck {
    /// Whether the secret may be consumed.
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }

    /// Map onto the caller-facing error taxonomy.
    pub fn into_result(self) -> AuthResult<()> {
        match self {
            Self::Valid => Ok(()),
            Self::Expired => Err(AuthError::TokenExpired),
            Self::Mismatch | Self::Missing => Err(AuthError::TokenInvalid),
        }
    }
}

/// Compare `supplied` with the pending secret. A wrong value is reported as
/// a mismatch even when the stored secret has also expired.
pub fn check_secret(
    stored: Option<&ExpiringSecret>,
    supplied: &str,
    now: DateTime<Utc>,
) -> SecretCheck {
    let Some(stored) = stored else {
        return SecretCheck::Missing;
    };
    if !digests_match(&stored.digest, &token_digest(supplied)) {
        return SecretCheck::Mismatch;
    }
    if stored.is_expired_at(now) {
        return SecretCheck::Expired;
    }
    SecretCheck::Valid
}

/// A freshly generated secret in the clear. Handed to delivery, never stored.
#[derive(Clone)]
pub struct IssuedSecret {
    /// Raw value to send to the account holder.
    pub value: String,
    /// When it stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedSecret")
            .field("value", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Lengths and lifetimes of verification codes and reset tokens.
#[derive(Debug, Clone, Copy)]
pub struct SecretPolicy {
    code_length: usize,
    code_ttl: Duration,
    token_length: usize,
    token_ttl: Duration,
}

impl SecretPolicy {
    /// Creates a policy from auth configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            code_length: config.verification_code_length,
            code_ttl: config.verification_code_ttl(),
            token_length: config.reset_token_length,
            token_ttl: config.reset_token_ttl(),
        }
    }

    /// New verification code: the raw value and its stored form.
    pub fn issue_verification_code(&self, now: DateTime<Utc>) -> (IssuedSecret, ExpiringSecret) {
        issue(generate_verification_code(self.code_length), now + self.code_ttl)
    }

    /// New password-reset token: the raw value and its stored form.
    pub fn issue_reset_token(&self, now: DateTime<Utc>) -> (IssuedSecret, ExpiringSecret) {
        issue(generate_token(self.token_length), now + self.token_ttl)
    }
}

impl Default for SecretPolicy {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

fn issue(value: String, expires_at: DateTime<Utc>) -> (IssuedSecret, ExpiringSecret) {
    let stored = ExpiringSecret::new(token_digest(&value), expires_at);
    (IssuedSecret { value, expires_at }, stored)
}
