//! Authentication outcomes that callers are expected to handle.
//!
//! Every expected failure (bad password, lockout, expired token) is a
//! variant here. Only unexpected collaborator failures travel as
//! [`AuthError::Infrastructure`].

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use pawhaven_core::error::{AppError, ErrorKind};

/// Typed result of an authentication operation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password. The message never says which.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The lockout window is active.
    #[error("Account is temporarily locked. Try again after {until}")]
    AccountLocked {
        /// When the lockout ends.
        until: DateTime<Utc>,
    },

    /// The account is inactive, banned, or soft-deleted.
    #[error("Account is inactive or has been deleted")]
    AccountInactiveOrDeleted,

    /// A token or one-time code has expired; request a new one.
    #[error("Token has expired")]
    TokenExpired,

    /// A token or one-time code is unknown, consumed, or does not match.
    #[error("Token is invalid")]
    TokenInvalid,

    /// The per-user critical section could not be entered in time.
    #[error("Another login for this account is in progress; please retry")]
    ConcurrencyConflict,

    /// Input failed validation (registration data, password policy).
    #[error("{0}")]
    Validation(String),

    /// A collaborator (store, hasher, delivery) failed unexpectedly.
    #[error(transparent)]
    Infrastructure(#[from] AppError),
}

/// A specialized `Result` type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Time left on a lockout, if this is one.
    pub fn retry_after(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            Self::AccountLocked { until } => Some((*until - now).max(Duration::zero())),
            _ => None,
        }
    }

    /// Whether the caller should simply retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let kind = match &err {
            AuthError::InvalidCredentials
            | AuthError::AccountLocked { .. }
            | AuthError::AccountInactiveOrDeleted
            | AuthError::TokenExpired
            | AuthError::TokenInvalid => ErrorKind::Authentication,
            AuthError::ConcurrencyConflict => ErrorKind::Conflict,
            AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::Infrastructure(inner) => return inner.clone(),
        };
        AppError::new(kind, err.to_string())
    }
}
