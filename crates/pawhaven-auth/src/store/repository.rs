//! Repository traits consumed by the auth services.
//!
//! Implementations must be thread-safe. Every method returns `AppError`
//! for infrastructure failures only; "not found" is `Ok(None)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use pawhaven_core::error::AppError;
use pawhaven_core::types::id::{AccountId, SessionId};
use pawhaven_entity::account::Account;
use pawhaven_entity::session::{Session, SessionActivity, SessionKey};

/// Account persistence.
#[async_trait]
pub trait AccountRepository: Send + Sync + std::fmt::Debug {
    /// Finds an account by id, including soft-deleted rows.
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AppError>;

    /// Finds an account by normalised email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    /// Finds the account holding a pending reset token with this digest.
    async fn find_by_reset_digest(&self, digest: &str) -> Result<Option<Account>, AppError>;

    /// Inserts a new account. A taken email is a `Conflict` error.
    async fn insert(&self, account: Account) -> Result<(), AppError>;

    /// Replaces a stored account. A missing row is a `NotFound` error.
    async fn save(&self, account: &Account) -> Result<(), AppError>;

    /// Writes the attempt counter and lock end together.
    async fn update_login_state(
        &self,
        id: AccountId,
        attempts: u32,
        locked_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

/// Session persistence.
///
/// `activate` is the transactional upsert that keeps at most one active
/// row per [`SessionKey`]; a shared store must run it in one transaction.
#[async_trait]
pub trait SessionRepository: Send + Sync + std::fmt::Debug {
    /// Finds a session by id.
    async fn find_by_id(&self, id: SessionId) -> Result<Option<Session>, AppError>;

    /// Finds the active session for a key, if any.
    async fn find_active_by_key(&self, key: &SessionKey) -> Result<Option<Session>, AppError>;

    /// Finds the session whose refresh token has this digest.
    async fn find_by_refresh_digest(&self, digest: &str) -> Result<Option<Session>, AppError>;

    /// Deactivates every other active session for the row's key, then
    /// inserts the row. Returns the ids that were deactivated.
    async fn activate(&self, session: Session) -> Result<Vec<SessionId>, AppError>;

    /// Replaces a stored session. Reactivating an inactive row is a
    /// `Conflict` error.
    async fn save(&self, session: &Session) -> Result<(), AppError>;

    /// Applies an activity update to an active row. Returns `false` when
    /// the row is missing or inactive.
    async fn record_activity(
        &self,
        id: SessionId,
        activity: SessionActivity,
    ) -> Result<bool, AppError>;

    /// Deactivates a row. Returns `true` if it was active.
    async fn deactivate(&self, id: SessionId, now: DateTime<Utc>) -> Result<bool, AppError>;

    /// Active rows the expiry sweep should retire at `now`.
    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Session>, AppError>;

    /// All rows for a key, active or not, oldest first.
    async fn list_by_key(&self, key: &SessionKey) -> Result<Vec<Session>, AppError>;
}
