//! Session entity model.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use pawhaven_core::types::{AccountId, SessionId};

use super::device::DeviceInfo;
use crate::secret::ExpiringSecret;

/// Composite owner key of a session.
///
/// Sessions reference their owner by id and namespace rather than by a
/// foreign key, so user, admin and vendor accounts can live in separate
/// tables and still share one session store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Owning account.
    pub user_id: AccountId,
    /// Namespace of the owning account kind.
    pub auth_entity: String,
}

impl SessionKey {
    /// Build a key from an account id and namespace.
    pub fn new(user_id: AccountId, auth_entity: impl Into<String>) -> Self {
        Self {
            user_id,
            auth_entity: auth_entity.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.auth_entity, self.user_id)
    }
}

/// Outcome of checking a session row against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionValidity {
    /// Session may authenticate requests.
    Valid,
    /// Session was deactivated (logout, re-login, sweep).
    Inactive,
    /// The hard session lifetime has passed.
    Expired,
    /// The access token has expired; a refresh may still succeed.
    AccessTokenExpired,
}

/// A login session. Rows are deactivated, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// Owning account.
    pub user_id: AccountId,
    /// Namespace of the owning account kind.
    pub auth_entity: String,
    /// Owner email at login time, for cross-checks.
    pub user_email: String,
    /// SHA-256 digest of the current access token.
    #[serde(skip_serializing, default)]
    pub access_token_digest: String,
    /// Access token expiry.
    pub access_token_expires: DateTime<Utc>,
    /// Digest and expiry of the current refresh token.
    #[serde(skip_serializing, default)]
    pub refresh: Option<ExpiringSecret>,
    /// Whether this is the owner's live session for its key.
    pub is_active: bool,
    /// Last recorded activity.
    pub last_activity: DateTime<Utc>,
    /// Hard kill-switch; the sweep deactivates rows past this instant.
    pub expires_at: Option<DateTime<Utc>>,
    /// Client device details.
    #[serde(flatten)]
    pub device: DeviceInfo,
    /// Free-form metadata (location hints, client version).
    pub metadata: Option<serde_json::Value>,
    /// Login time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a session row.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Identifier, chosen before the access token is signed.
    pub id: SessionId,
    /// Owner key.
    pub key: SessionKey,
    /// Owner email.
    pub user_email: String,
    /// Access token digest.
    pub access_token_digest: String,
    /// Access token expiry.
    pub access_token_expires: DateTime<Utc>,
    /// Refresh token digest and expiry.
    pub refresh: Option<ExpiringSecret>,
    /// Hard kill-switch.
    pub expires_at: Option<DateTime<Utc>>,
    /// Client device details.
    pub device: DeviceInfo,
    /// Free-form metadata.
    pub metadata: Option<serde_json::Value>,
}

/// Activity side-channel update.
#[derive(Debug, Clone)]
pub struct SessionActivity {
    /// When the activity happened.
    pub at: DateTime<Utc>,
    /// New client IP, if it changed.
    pub ip_address: Option<String>,
    /// New user agent, if it changed.
    pub user_agent: Option<String>,
}

impl Session {
    /// Build an active session row.
    pub fn new(new: NewSession, now: DateTime<Utc>) -> Self {
        Self {
            id: new.id,
            user_id: new.key.user_id,
            auth_entity: new.key.auth_entity,
            user_email: new.user_email,
            access_token_digest: new.access_token_digest,
            access_token_expires: new.access_token_expires,
            refresh: new.refresh,
            is_active: true,
            last_activity: now,
            expires_at: new.expires_at,
            device: new.device,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Owner key of this session.
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.user_id, self.auth_entity.clone())
    }

    /// Classify the row at `now`. Never mutates.
    pub fn validity(&self, now: DateTime<Utc>) -> SessionValidity {
        if !self.is_active {
            return SessionValidity::Inactive;
        }
        if self.is_past_hard_expiry(now) {
            return SessionValidity::Expired;
        }
        if self.access_token_expires <= now {
            return SessionValidity::AccessTokenExpired;
        }
        SessionValidity::Valid
    }

    /// Active, within its hard lifetime, and holding an unexpired access token.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.validity(now) == SessionValidity::Valid
    }

    /// Whether the hard kill-switch has passed.
    pub fn is_past_hard_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Whether a refresh token exists and has not expired.
    pub fn is_refresh_token_valid(&self, now: DateTime<Utc>) -> bool {
        self.refresh.as_ref().is_some_and(|r| !r.is_expired_at(now))
    }

    /// Advisory: true once `now` is within `threshold` of access expiry.
    pub fn needs_refresh(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        now >= self.access_token_expires - threshold
    }

    /// Whether the sweep should retire this row: active, and either past its
    /// hard lifetime or holding no token that could still be used.
    pub fn is_sweepable(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && (self.is_past_hard_expiry(now)
                || (self.access_token_expires <= now && !self.is_refresh_token_valid(now)))
    }

    /// Install a new access token and, optionally, a new refresh token.
    pub fn replace_tokens(
        &mut self,
        access_token_digest: String,
        access_token_expires: DateTime<Utc>,
        refresh: Option<ExpiringSecret>,
        now: DateTime<Utc>,
    ) {
        self.access_token_digest = access_token_digest;
        self.access_token_expires = access_token_expires;
        if let Some(refresh) = refresh {
            self.refresh = Some(refresh);
        }
        self.last_activity = now;
        self.updated_at = now;
    }

    /// Apply an activity update. Absent fields keep their old values.
    pub fn record_activity(&mut self, activity: &SessionActivity) {
        self.last_activity = activity.at;
        if let Some(ip) = &activity.ip_address {
            self.device.ip_address = Some(ip.clone());
        }
        if let Some(ua) = &activity.user_agent {
            self.device.user_agent = Some(ua.clone());
        }
        self.updated_at = activity.at;
    }

    /// Logout or forced invalidation. The row stays as history.
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.last_activity = now;
        self.updated_at = now;
    }

    /// The view without any token material or network metadata.
    pub fn to_safe_view(&self) -> SafeSession {
        SafeSession {
            id: self.id,
            user_id: self.user_id,
            auth_entity: self.auth_entity.clone(),
            user_email: self.user_email.clone(),
            is_active: self.is_active,
            last_activity: self.last_activity,
            device_name: self.device.device_name.clone(),
            device_type: self.device.device_type.clone(),
            access_token_expires: self.access_token_expires,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// Session data that may be shown to its owner (device lists, audit UI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeSession {
    /// Session identifier.
    pub id: SessionId,
    /// Owning account.
    pub user_id: AccountId,
    /// Namespace of the owner.
    pub auth_entity: String,
    /// Owner email.
    pub user_email: String,
    /// Whether the session is live.
    pub is_active: bool,
    /// Last activity.
    pub last_activity: DateTime<Utc>,
    /// Friendly device name.
    pub device_name: Option<String>,
    /// Device class.
    pub device_type: Option<String>,
    /// Access token expiry.
    pub access_token_expires: DateTime<Utc>,
    /// Login time.
    pub created_at: DateTime<Utc>,
    /// Hard kill-switch.
    pub expires_at: Option<DateTime<Utc>>,
}
