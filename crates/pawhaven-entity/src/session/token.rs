//! Raw token values handed to the client once.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access token plus, when one was issued, a refresh token.
///
/// Only digests of these values are persisted.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed access token.
    pub access_token: String,
    /// Access token expiry.
    pub access_token_expires: DateTime<Utc>,
    /// Opaque refresh token. `None` after a refresh without rotation,
    /// in which case the client keeps its current refresh token.
    pub refresh_token: Option<String>,
    /// Refresh token expiry.
    pub refresh_token_expires: Option<DateTime<Utc>>,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[redacted]")
            .field("access_token_expires", &self.access_token_expires)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .field("refresh_token_expires", &self.refresh_token_expires)
            .finish()
    }
}
