//! Failed-login counting and lockout windows.

use chrono::{DateTime, Duration, Utc};

use pawhaven_core::config::AuthConfig;
use pawhaven_entity::account::Account;

/// Counter and lock end produced by one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAttemptOutcome {
    /// New consecutive-failure count.
    pub attempts: u32,
    /// Lock end, when the count reached the threshold.
    pub locked_until: Option<DateTime<Utc>>,
}

impl LoginAttemptOutcome {
    /// Whether this attempt triggered a lockout.
    pub fn locked(&self) -> bool {
        self.locked_until.is_some()
    }
}

/// Lockout thresholds.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    max_attempts: u32,
    lock_duration: Duration,
}

impl LockoutPolicy {
    /// Creates a policy from explicit values.
    pub fn new(max_attempts: u32, lock_duration: Duration) -> Self {
        assert!(max_attempts > 0, "max_attempts must be at least 1");
        Self {
            max_attempts,
            lock_duration,
        }
    }

    /// Creates a policy from auth configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.max_login_attempts,
            config.lockout_duration(),
        )
    }

    /// Failures that trigger a lockout.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Count one more failure; lock once the count reaches the maximum.
    pub fn evaluate_login_attempt(
        &self,
        current_attempts: u32,
        now: DateTime<Utc>,
    ) -> LoginAttemptOutcome {
        let attempts = current_attempts.saturating_add(1);
        let locked_until = (attempts >= self.max_attempts).then(|| now + self.lock_duration);
        LoginAttemptOutcome {
            attempts,
            locked_until,
        }
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

/// Locked iff a lock end is set and strictly in the future.
pub fn is_locked(locked_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    locked_until.is_some_and(|until| until > now)
}

/// Active status, not soft-deleted, and not locked.
pub fn can_authenticate(account: &Account, now: DateTime<Utc>) -> bool {
    account.is_active() && !is_locked(account.core.locked_until, now)
}
