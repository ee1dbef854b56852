//! Session lifecycle manager: create, validate, refresh, and deactivate.
//!
//! Every write for a `(user_id, auth_entity)` pair runs under that pair's
//! [`KeyedLock`], and the repository's `activate` keeps at most one active
//! row per pair even if two managers share a store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use pawhaven_core::clock::Clock;
use pawhaven_core::config::{AuthConfig, SessionConfig, minutes};
use pawhaven_core::error::ErrorKind;
use pawhaven_core::types::id::SessionId;
use pawhaven_entity::account::Account;
use pawhaven_entity::secret::ExpiringSecret;
use pawhaven_entity::session::{
    DeviceInfo, NewSession, SafeSession, Session, SessionActivity, SessionKey, SessionValidity,
    TokenPair,
};

use crate::error::{AuthError, AuthResult};
use crate::jwt::{JwtDecoder, JwtEncoder};
use crate::policy::{digests_match, generate_token, token_digest};
use crate::store::{KeyedLock, SessionRepository};

/// Per-call overrides for session creation.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Access token lifetime; the configured default when `None`.
    pub access_ttl: Option<Duration>,
    /// Refresh token lifetime; the configured default when `None`.
    pub refresh_ttl: Option<Duration>,
    /// Whether to issue a refresh token at all.
    pub issue_refresh_token: bool,
    /// Client metadata recorded on the row.
    pub device: DeviceInfo,
    /// Free-form data for the host application.
    pub metadata: Option<serde_json::Value>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            access_ttl: None,
            refresh_ttl: None,
            issue_refresh_token: true,
            device: DeviceInfo::default(),
            metadata: None,
        }
    }
}

impl SessionOptions {
    /// Default lifetimes for the given client.
    pub fn for_device(device: DeviceInfo) -> Self {
        Self {
            device,
            ..Self::default()
        }
    }
}

/// A stored session together with the raw tokens minted for it.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// The row as stored.
    pub session: Session,
    /// Raw tokens, returned to the client once.
    pub tokens: TokenPair,
}

/// Manages the complete session lifecycle.
pub struct SessionManager {
    sessions: Arc<dyn SessionRepository>,
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    clock: Arc<dyn Clock>,
    locks: Arc<KeyedLock<SessionKey>>,
    config: SessionConfig,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .field("locks", &self.locks)
            .finish()
    }
}

impl SessionManager {
    /// Creates a manager over the given repository.
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        auth_config: &AuthConfig,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let lock_timeout = std::time::Duration::from_millis(config.lock_timeout_ms);
        Self {
            sessions,
            encoder: JwtEncoder::new(auth_config),
            decoder: JwtDecoder::new(auth_config),
            clock,
            locks: Arc::new(KeyedLock::new(lock_timeout)),
            config,
        }
    }

    pub(crate) fn repository(&self) -> &Arc<dyn SessionRepository> {
        &self.sessions
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn locks(&self) -> &Arc<KeyedLock<SessionKey>> {
        &self.locks
    }

    /// Session configuration in force.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn access_ttl(&self) -> Duration {
        self.config.access_token_ttl()
    }

    fn refresh_ttl(&self) -> Duration {
        self.config.refresh_token_ttl()
    }

    fn mint_refresh(&self, now: DateTime<Utc>, ttl: Duration) -> (String, ExpiringSecret) {
        let raw = generate_token(self.config.refresh_token_length);
        let stored = ExpiringSecret::new(token_digest(&raw), now + ttl);
        (raw, stored)
    }

    /// Hard lifetime of a row: the absolute timeout when configured,
    /// otherwise the expiry of its longest-lived token.
    fn hard_expiry(&self, now: DateTime<Utc>, token_expiry: DateTime<Utc>) -> DateTime<Utc> {
        match self.config.absolute_timeout() {
            Some(timeout) => now + timeout,
            None => token_expiry,
        }
    }

    /// Start a session for `account`, replacing any active one for the same
    /// `(user_id, auth_entity)`.
    pub async fn create(
        &self,
        account: &Account,
        options: SessionOptions,
    ) -> AuthResult<IssuedSession> {
        let key = account.session_key();
        let _guard = self.locks.acquire(&key).await?;
        let now = self.clock.now();

        let session_id = SessionId::new();
        let access_expires = now + options.access_ttl.unwrap_or_else(|| self.access_ttl());
        let access_token = self
            .encoder
            .encode_access(session_id, &key, now, access_expires)?;

        let refresh = options.issue_refresh_token.then(|| {
            self.mint_refresh(now, options.refresh_ttl.unwrap_or_else(|| self.refresh_ttl()))
        });
        let longest = refresh
            .as_ref()
            .map_or(access_expires, |(_, stored)| stored.expires_at.max(access_expires));

        let (refresh_token, refresh_secret) = refresh.unzip();
        let refresh_expires = refresh_secret.as_ref().map(|r| r.expires_at);

        let session = Session::new(
            NewSession {
                id: session_id,
                key: key.clone(),
                user_email: account.email().to_string(),
                access_token_digest: token_digest(&access_token),
                access_token_expires: access_expires,
                refresh: refresh_secret,
                expires_at: Some(self.hard_expiry(now, longest)),
                device: options.device,
                metadata: options.metadata,
            },
            now,
        );

        let replaced = self.sessions.activate(session.clone()).await?;

        info!(
            user_id = %key.user_id,
            auth_entity = %key.auth_entity,
            session_id = %session_id,
            replaced = replaced.len(),
            "Session created"
        );

        Ok(IssuedSession {
            session,
            tokens: TokenPair {
                access_token,
                access_token_expires: access_expires,
                refresh_token,
                refresh_token_expires: refresh_expires,
            },
        })
    }

    /// Resolve an access token to its active session. Never mutates.
    pub async fn validate_access_token(&self, token: &str) -> AuthResult<Session> {
        let claims = self.decoder.decode(token)?;
        let session = self
            .sessions
            .find_by_id(claims.sid)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        if session.key() != claims.session_key()
            || !digests_match(&session.access_token_digest, &token_digest(token))
        {
            return Err(AuthError::TokenInvalid);
        }

        match session.validity(self.clock.now()) {
            SessionValidity::Valid => Ok(session),
            SessionValidity::Inactive => Err(AuthError::TokenInvalid),
            SessionValidity::Expired | SessionValidity::AccessTokenExpired => {
                Err(AuthError::TokenExpired)
            }
        }
    }

    /// Look up the session holding this refresh token, whatever its state.
    pub async fn find_by_refresh_token(&self, refresh_token: &str) -> AuthResult<Option<Session>> {
        Ok(self
            .sessions
            .find_by_refresh_digest(&token_digest(refresh_token))
            .await?)
    }

    /// Whether `refresh_token` may refresh `session` right now. Reads only.
    pub fn check_refresh(&self, session: &Session, refresh_token: &str) -> AuthResult<()> {
        let now = self.clock.now();
        let stored = session.refresh.as_ref().ok_or(AuthError::TokenInvalid)?;
        if !session.is_active || !digests_match(&stored.digest, &token_digest(refresh_token)) {
            return Err(AuthError::TokenInvalid);
        }
        if stored.is_expired_at(now) || session.is_past_hard_expiry(now) {
            debug!(session_id = %session.id, "Refresh rejected: expired");
            return Err(AuthError::TokenExpired);
        }
        Ok(())
    }

    /// Exchange a refresh token for a new access token, rotating the
    /// refresh token when configured. A rejected refresh changes nothing.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<IssuedSession> {
        let digest = token_digest(refresh_token);
        let found = self
            .sessions
            .find_by_refresh_digest(&digest)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        let key = found.key();
        let _guard = self.locks.acquire(&key).await?;

        // Re-read under the lock; a concurrent refresh may have rotated it.
        let mut session = self
            .sessions
            .find_by_id(found.id)
            .await?
            .ok_or(AuthError::TokenInvalid)?;
        let now = self.clock.now();
        self.check_refresh(&session, refresh_token)?;

        let access_expires = now + self.access_ttl();
        let access_token = self
            .encoder
            .encode_access(session.id, &key, now, access_expires)?;

        let rotated = self
            .config
            .rotate_refresh_tokens
            .then(|| self.mint_refresh(now, self.refresh_ttl()));
        let (new_raw, new_secret) = rotated.unzip();
        if let Some(secret) = &new_secret {
            if self.config.absolute_timeout_hours.is_none() {
                session.expires_at = Some(secret.expires_at.max(access_expires));
            }
        }

        session.replace_tokens(token_digest(&access_token), access_expires, new_secret, now);
        self.sessions.save(&session).await.map_err(|e| match e.kind {
            ErrorKind::Conflict => AuthError::TokenInvalid,
            _ => AuthError::Infrastructure(e),
        })?;

        info!(
            user_id = %key.user_id,
            session_id = %session.id,
            rotated = new_raw.is_some(),
            "Token refreshed"
        );

        let refresh_expires = session.refresh.as_ref().map(|r| r.expires_at);
        Ok(IssuedSession {
            tokens: TokenPair {
                access_token,
                access_token_expires: access_expires,
                refresh_token: new_raw,
                refresh_token_expires: refresh_expires,
            },
            session,
        })
    }

    /// Whether the client should refresh now. Advisory only.
    pub fn needs_refresh(&self, session: &Session, threshold_minutes: Option<u64>) -> bool {
        let threshold = threshold_minutes.map_or_else(|| self.config.refresh_threshold(), minutes);
        session.needs_refresh(self.clock.now(), threshold)
    }

    /// Deactivate one session. `Ok(None)` when the id is unknown, otherwise
    /// whether the row was active before the call.
    pub async fn deactivate(&self, session_id: SessionId) -> AuthResult<Option<bool>> {
        let Some(session) = self.sessions.find_by_id(session_id).await? else {
            return Ok(None);
        };
        let _guard = self.locks.acquire(&session.key()).await?;
        let was_active = self
            .sessions
            .deactivate(session_id, self.clock.now())
            .await?;
        if was_active {
            info!(
                user_id = %session.user_id,
                session_id = %session_id,
                "Session deactivated"
            );
        }
        Ok(Some(was_active))
    }

    /// Deactivate every active session for a key. Returns how many changed.
    pub async fn deactivate_all(&self, key: &SessionKey) -> AuthResult<usize> {
        let _guard = self.locks.acquire(key).await?;
        let now = self.clock.now();
        let mut deactivated = 0;
        for session in self.sessions.list_by_key(key).await? {
            if session.is_active && self.sessions.deactivate(session.id, now).await? {
                deactivated += 1;
            }
        }
        if deactivated > 0 {
            info!(user_id = %key.user_id, count = deactivated, "Sessions deactivated");
        }
        Ok(deactivated)
    }

    /// Record request activity. Failures are logged, never returned, and an
    /// inactive session is left untouched.
    ///
    /// Runs under the session key's lock so a concurrent refresh, which
    /// rewrites the whole row, cannot drop the update.
    pub async fn update_activity(
        &self,
        session_id: SessionId,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        if let Err(e) = self.record_activity(session_id, ip_address, user_agent).await {
            warn!(session_id = %session_id, error = %e, "Failed to update session activity");
        }
    }

    async fn record_activity(
        &self,
        session_id: SessionId,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> AuthResult<()> {
        let Some(session) = self.sessions.find_by_id(session_id).await? else {
            debug!(session_id = %session_id, "Activity for unknown session ignored");
            return Ok(());
        };
        let _guard = self.locks.acquire(&session.key()).await?;

        let device = DeviceInfo::new(ip_address, user_agent);
        let activity = SessionActivity {
            at: self.clock.now(),
            ip_address: device.ip_address,
            user_agent: device.user_agent,
        };
        if !self.sessions.record_activity(session_id, activity).await? {
            debug!(session_id = %session_id, "Activity for inactive session ignored");
        }
        Ok(())
    }

    /// Session history for a key, without token material.
    pub async fn list_sessions(&self, key: &SessionKey) -> AuthResult<Vec<SafeSession>> {
        Ok(self
            .sessions
            .list_by_key(key)
            .await?
            .iter()
            .map(Session::to_safe_view)
            .collect())
    }
}
