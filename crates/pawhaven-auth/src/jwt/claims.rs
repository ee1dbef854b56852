//! JWT claims carried by access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pawhaven_core::types::id::{AccountId, SessionId};
use pawhaven_entity::session::SessionKey;

/// JWT claims payload embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the account ID.
    pub sub: AccountId,
    /// Session this token belongs to.
    pub sid: SessionId,
    /// Session namespace (`users`, `admins`, `vendors`).
    pub auth_entity: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Unique token ID, so two tokens minted in the same second differ.
    pub jti: Uuid,
}

impl Claims {
    /// Session key of the token's owner.
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.sub, self.auth_entity.clone())
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Whether the token has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
