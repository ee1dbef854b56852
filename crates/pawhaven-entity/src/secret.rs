//! Digest-plus-expiry pairs for one-time secrets and refresh tokens.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored secret: the digest of the raw value and its expiry.
///
/// Keeping both in one value means a secret can only ever be present or
/// absent as a whole; there is no state with a code but no expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringSecret {
    /// Hex-encoded SHA-256 digest of the raw secret.
    pub digest: String,
    /// Instant after which the secret is no longer accepted.
    pub expires_at: DateTime<Utc>,
}

impl ExpiringSecret {
    /// Create a secret record from a digest and its expiry.
    pub fn new(digest: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            digest: digest.into(),
            expires_at,
        }
    }

    /// Whether the secret has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl fmt::Debug for ExpiringSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringSecret")
            .field("digest", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
