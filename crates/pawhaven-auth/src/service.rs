//! The authentication operations exposed to the host layer.
//!
//! Locks are always taken in one order: the account's lock, then the
//! session key's lock. Login holds the account lock from the credential
//! check until its session exists, and password reset and deletion hold
//! it until every session is ended, so neither can slip between the other's
//! steps.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use pawhaven_core::clock::Clock;
use pawhaven_core::config::{AccountDefaults, AppConfig};
use pawhaven_core::error::{AppError, ErrorKind};
use pawhaven_core::types::id::{AccountId, SessionId};
use pawhaven_entity::account::model::normalize_email;
use pawhaven_entity::account::{Account, NewAccount, PublicAccount};
use pawhaven_entity::session::{DeviceInfo, SafeSession, Session, TokenPair};

use crate::account::AccountSecurity;
use crate::delivery::SecretDelivery;
use crate::error::{AuthError, AuthResult};
use crate::password::{PasswordHashing, PasswordValidator};
use crate::policy::token_digest;
use crate::session::{SessionCleanup, SessionManager, SessionOptions};
use crate::store::{AccountRepository, KeyedLock, SessionRepository};

/// Hashed once at startup and verified against when the email is unknown,
/// so both paths cost one hash verification.
const TIMING_DUMMY_PASSWORD: &str = "pawhaven-timing-equaliser";

const DUPLICATE_EMAIL: &str = "An account with this email already exists";

/// Credentials and client metadata for a login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email as typed; normalised before lookup.
    pub email: String,
    /// Plaintext password.
    #[serde(skip_serializing)]
    pub password: String,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Client-supplied device name.
    pub device_name: Option<String>,
    /// Client-supplied device type.
    pub device_type: Option<String>,
}

impl LoginRequest {
    /// Credentials without client metadata.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Attach the client's network metadata.
    pub fn from_client(mut self, ip_address: Option<&str>, user_agent: Option<&str>) -> Self {
        self.ip_address = ip_address.map(String::from);
        self.user_agent = user_agent.map(String::from);
        self
    }

    fn device(&self) -> DeviceInfo {
        DeviceInfo::new(self.ip_address.as_deref(), self.user_agent.as_deref())
            .with_device(self.device_name.as_deref(), self.device_type.as_deref())
    }
}

/// Successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    /// The authenticated account.
    pub account: PublicAccount,
    /// The new session.
    pub session: SafeSession,
    /// Raw tokens for the client.
    pub tokens: TokenPair,
}

/// Successful token refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResult {
    /// The refreshed session.
    pub session: SafeSession,
    /// New access token and, when rotated, a new refresh token.
    pub tokens: TokenPair,
}

/// Login, session, verification and password-reset operations.
pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    sessions: Arc<SessionManager>,
    security: AccountSecurity,
    hasher: Arc<dyn PasswordHashing>,
    validator: PasswordValidator,
    delivery: Arc<dyn SecretDelivery>,
    account_locks: Arc<KeyedLock<AccountId>>,
    defaults: AccountDefaults,
    dummy_hash: String,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("sessions", &self.sessions)
            .field("security", &self.security)
            .finish()
    }
}

impl AuthService {
    /// Wires the service from configuration and its collaborators.
    pub fn new(
        config: &AppConfig,
        accounts: Arc<dyn AccountRepository>,
        sessions: Arc<dyn SessionRepository>,
        hasher: Arc<dyn PasswordHashing>,
        delivery: Arc<dyn SecretDelivery>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        let dummy_hash = hasher.hash(TIMING_DUMMY_PASSWORD)?;
        let lock_timeout = std::time::Duration::from_millis(config.session.lock_timeout_ms);
        let manager = SessionManager::new(
            sessions,
            &config.auth,
            config.session.clone(),
            Arc::clone(&clock),
        );

        Ok(Self {
            accounts,
            sessions: Arc::new(manager),
            security: AccountSecurity::new(&config.auth, clock),
            hasher,
            validator: PasswordValidator::new(&config.auth),
            delivery,
            account_locks: Arc::new(KeyedLock::new(lock_timeout)),
            defaults: config.account.clone(),
            dummy_hash,
        })
    }

    /// The session lifecycle manager.
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// An expiry sweep over this service's sessions and lock tables.
    pub fn cleanup(&self) -> SessionCleanup {
        SessionCleanup::new(&self.sessions).with_account_locks(Arc::clone(&self.account_locks))
    }

    /// Create an active account with a pending verification code.
    pub async fn register(&self, input: NewAccount, password: &str) -> AuthResult<PublicAccount> {
        let input = input.normalized();
        input
            .check()
            .map_err(|e| AuthError::Validation(e.message))?;
        self.validator.validate(
            password,
            &[&input.email, &input.first_name, &input.last_name],
        )?;

        if self.accounts.find_by_email(&input.email).await?.is_some() {
            return Err(AuthError::Validation(DUPLICATE_EMAIL.into()));
        }

        let password_hash = self.hasher.hash(password)?;
        let mut account = Account::new(input, password_hash, &self.defaults, self.security.now());
        let code = self.security.issue_verification_code(&mut account);
        let public = account.to_public_view();

        self.accounts.insert(account).await.map_err(|e| match e.kind {
            ErrorKind::Conflict => AuthError::Validation(DUPLICATE_EMAIL.into()),
            _ => AuthError::Infrastructure(e),
        })?;

        info!(
            user_id = %public.id,
            auth_entity = %public.auth_entity,
            "Account registered"
        );

        // The account is committed; a lost code can be re-requested.
        if let Err(e) = self.delivery.deliver_verification_code(&public, &code).await {
            warn!(user_id = %public.id, error = %e, "Verification code delivery failed");
        }
        Ok(public)
    }

    /// Authenticate and start a session, replacing any active one.
    ///
    /// A locked account is refused before the password is checked, so the
    /// correct password does not help during a lockout. Inactive and deleted
    /// accounts only learn their status after presenting the right password.
    pub async fn login(&self, request: LoginRequest) -> AuthResult<LoginResult> {
        let email = normalize_email(&request.email);

        let Some(found) = self.accounts.find_by_email(&email).await? else {
            let _ = self.hasher.verify(&request.password, &self.dummy_hash);
            debug!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let account_id = found.id();
        let _guard = self.account_locks.acquire(&account_id).await?;
        let mut account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if let Some(until) = self.security.active_lock(&account) {
            warn!(user_id = %account_id, locked_until = %until, "Login refused: account locked");
            return Err(AuthError::AccountLocked { until });
        }

        if !self
            .hasher
            .verify(&request.password, &account.core.password_hash)?
        {
            if account.is_active() {
                let outcome = self.security.record_failed_login(&mut account);
                self.accounts
                    .update_login_state(
                        account_id,
                        outcome.attempts,
                        outcome.locked_until,
                        account.core.updated_at,
                    )
                    .await?;
                if outcome.locked() {
                    warn!(
                        user_id = %account_id,
                        attempts = outcome.attempts,
                        "Account locked after repeated failed logins"
                    );
                } else {
                    info!(user_id = %account_id, attempts = outcome.attempts, "Failed login attempt");
                }
            }
            return Err(AuthError::InvalidCredentials);
        }

        if !account.is_active() {
            info!(user_id = %account_id, status = %account.core.status, "Login refused: account unusable");
            return Err(AuthError::AccountInactiveOrDeleted);
        }

        self.security.record_successful_login(
            &mut account,
            request.ip_address.as_deref(),
            request.user_agent.as_deref(),
        );
        self.accounts.save(&account).await?;

        let issued = self
            .sessions
            .create(&account, SessionOptions::for_device(request.device()))
            .await?;

        info!(
            user_id = %account_id,
            session_id = %issued.session.id,
            "Login successful"
        );

        Ok(LoginResult {
            account: account.to_public_view(),
            session: issued.session.to_safe_view(),
            tokens: issued.tokens,
        })
    }

    /// Exchange a refresh token for new tokens on the same session.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<RefreshResult> {
        let session = self
            .sessions
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::TokenInvalid)?;
        self.sessions.check_refresh(&session, refresh_token)?;

        let owner_active = self
            .accounts
            .find_by_id(session.user_id)
            .await?
            .is_some_and(|account| account.is_active());
        if !owner_active {
            info!(session_id = %session.id, "Refresh refused: account unusable");
            return Err(AuthError::AccountInactiveOrDeleted);
        }

        let issued = self.sessions.refresh(refresh_token).await?;
        Ok(RefreshResult {
            session: issued.session.to_safe_view(),
            tokens: issued.tokens,
        })
    }

    /// End a session. Logging out twice is not an error; an unknown id is.
    pub async fn logout(&self, session_id: SessionId) -> AuthResult<()> {
        match self.sessions.deactivate(session_id).await? {
            Some(_) => Ok(()),
            None => Err(AuthError::TokenInvalid),
        }
    }

    /// Resolve an access token to its session.
    pub async fn validate_access_token(&self, access_token: &str) -> AuthResult<Session> {
        self.sessions.validate_access_token(access_token).await
    }

    /// Record request activity on a session. Never fails.
    pub async fn update_activity(
        &self,
        session_id: SessionId,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.sessions
            .update_activity(session_id, ip_address, user_agent)
            .await;
    }

    /// Send a fresh verification code. Silent for unknown, unusable, or
    /// already verified accounts.
    pub async fn request_verification(&self, email: &str) -> AuthResult<()> {
        let Some((account, code)) = self
            .issue_for(email, |security, account| {
                (!account.core.is_email_verified)
                    .then(|| security.issue_verification_code(account))
            })
            .await?
        else {
            return Ok(());
        };

        self.delivery
            .deliver_verification_code(&account.to_public_view(), &code)
            .await?;
        Ok(())
    }

    /// Confirm an email address with the code sent to it.
    pub async fn verify_account(&self, email: &str, code: &str) -> AuthResult<PublicAccount> {
        let email = normalize_email(email);
        let found = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        let _guard = self.account_locks.acquire(&found.id()).await?;
        let mut account = self
            .accounts
            .find_by_id(found.id())
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        self.security.consume_verification_code(&mut account, code)?;
        if !account.is_active() {
            return Err(AuthError::AccountInactiveOrDeleted);
        }
        account.mark_email_verified(self.security.now());
        self.accounts.save(&account).await?;

        info!(user_id = %account.id(), "Email verified");
        Ok(account.to_public_view())
    }

    /// Send a password-reset token. Silent for unknown or unusable accounts.
    pub async fn request_password_reset(&self, email: &str) -> AuthResult<()> {
        let Some((account, token)) = self
            .issue_for(email, |security, account| {
                Some(security.issue_reset_token(account))
            })
            .await?
        else {
            return Ok(());
        };

        self.delivery
            .deliver_reset_token(&account.to_public_view(), &token)
            .await?;
        Ok(())
    }

    /// Set a new password with a reset token. Clears any lockout and ends
    /// every session of the account.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AuthResult<()> {
        let found = self
            .accounts
            .find_by_reset_digest(&token_digest(token))
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        let _guard = self.account_locks.acquire(&found.id()).await?;
        let mut account = self
            .accounts
            .find_by_id(found.id())
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        self.security.consume_reset_token(&mut account, token)?;
        if !account.is_active() {
            return Err(AuthError::AccountInactiveOrDeleted);
        }
        self.validator.validate(
            new_password,
            &[
                &account.core.email,
                &account.core.first_name,
                &account.core.last_name,
            ],
        )?;

        let now = self.security.now();
        let password_hash = self.hasher.hash(new_password)?;
        account.set_password_hash(password_hash, now);
        account.apply_login_attempt(0, None, now);
        self.accounts.save(&account).await?;

        let ended = self.sessions.deactivate_all(&account.session_key()).await?;
        info!(user_id = %account.id(), sessions_ended = ended, "Password reset");
        Ok(())
    }

    /// Soft-delete an account and end its sessions.
    pub async fn delete_account(&self, account_id: AccountId) -> AuthResult<()> {
        let _guard = self.account_locks.acquire(&account_id).await?;
        let mut account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))?;

        account.soft_delete(self.security.now());
        self.accounts.save(&account).await?;

        let ended = self.sessions.deactivate_all(&account.session_key()).await?;
        info!(user_id = %account_id, sessions_ended = ended, "Account deleted");
        Ok(())
    }

    /// Load an active account by email under its lock, let `issue` attach a
    /// secret, and persist it. `None` when there is nothing to send.
    async fn issue_for<T>(
        &self,
        email: &str,
        issue: impl FnOnce(&AccountSecurity, &mut Account) -> Option<T>,
    ) -> AuthResult<Option<(Account, T)>> {
        let email = normalize_email(email);
        let Some(found) = self.accounts.find_by_email(&email).await? else {
            debug!("Secret requested for unknown email");
            return Ok(None);
        };

        let _guard = self.account_locks.acquire(&found.id()).await?;
        let Some(mut account) = self.accounts.find_by_id(found.id()).await? else {
            return Ok(None);
        };
        if !account.is_active() {
            debug!(user_id = %account.id(), "Secret requested for unusable account");
            return Ok(None);
        }

        let Some(secret) = issue(&self.security, &mut account) else {
            return Ok(None);
        };
        self.accounts.save(&account).await?;
        Ok(Some((account, secret)))
    }
}
