//! Applies the credential policy to an account snapshot.
//!
//! Every method here mutates the in-memory [`Account`] only. Callers are
//! responsible for persisting the result inside the account's critical
//! section.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use pawhaven_core::clock::Clock;
use pawhaven_core::config::AuthConfig;
use pawhaven_entity::account::Account;

use crate::error::AuthResult;
use crate::policy::{
    IssuedSecret, LockoutPolicy, LoginAttemptOutcome, SecretPolicy, can_authenticate,
    check_secret, is_locked,
};

/// Lockout and one-time secret transitions for accounts.
#[derive(Debug, Clone)]
pub struct AccountSecurity {
    lockout: LockoutPolicy,
    secrets: SecretPolicy,
    clock: Arc<dyn Clock>,
}

impl AccountSecurity {
    /// Creates the transitions from auth configuration.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            lockout: LockoutPolicy::from_config(config),
            secrets: SecretPolicy::from_config(config),
            clock,
        }
    }

    /// Current instant from the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The lockout thresholds in force.
    pub fn lockout(&self) -> &LockoutPolicy {
        &self.lockout
    }

    /// Active, not deleted, and not locked.
    pub fn can_authenticate(&self, account: &Account) -> bool {
        can_authenticate(account, self.now())
    }

    /// End of the current lockout, if one is in force.
    pub fn active_lock(&self, account: &Account) -> Option<DateTime<Utc>> {
        let locked_until = account.core.locked_until;
        is_locked(locked_until, self.now())
            .then_some(locked_until)
            .flatten()
    }

    /// Count a failed password. A lock that has already run out starts a
    /// fresh window, so one failure after expiry does not relock.
    pub fn record_failed_login(&self, account: &mut Account) -> LoginAttemptOutcome {
        let now = self.now();
        let current = match account.core.locked_until {
            Some(until) if until <= now => 0,
            _ => account.core.login_attempts,
        };
        let outcome = self.lockout.evaluate_login_attempt(current, now);
        account.apply_login_attempt(outcome.attempts, outcome.locked_until, now);
        outcome
    }

    /// Reset lock state and stamp login tracking in one mutation.
    pub fn record_successful_login(
        &self,
        account: &mut Account,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        account.apply_login_success(self.now(), ip_address, user_agent);
    }

    /// Replace any pending verification code with a fresh one.
    pub fn issue_verification_code(&self, account: &mut Account) -> IssuedSecret {
        let now = self.now();
        let (issued, stored) = self.secrets.issue_verification_code(now);
        account.set_verification(stored, now);
        issued
    }

    /// Replace any pending reset token with a fresh one.
    pub fn issue_reset_token(&self, account: &mut Account) -> IssuedSecret {
        let now = self.now();
        let (issued, stored) = self.secrets.issue_reset_token(now);
        account.set_password_reset(stored, now);
        issued
    }

    /// Drop the pending verification code.
    pub fn clear_verification_code(&self, account: &mut Account) {
        account.clear_verification(self.now());
    }

    /// Drop the pending reset token.
    pub fn clear_reset_token(&self, account: &mut Account) {
        account.clear_password_reset(self.now());
    }

    /// Check the code and clear it on success. Failures leave the account
    /// untouched, so an expired code stays until it is replaced.
    pub fn consume_verification_code(&self, account: &mut Account, code: &str) -> AuthResult<()> {
        let now = self.now();
        check_secret(account.core.verification.as_ref(), code, now).into_result()?;
        account.clear_verification(now);
        Ok(())
    }

    /// Check the token and clear it on success.
    pub fn consume_reset_token(&self, account: &mut Account, token: &str) -> AuthResult<()> {
        let now = self.now();
        check_secret(account.core.password_reset.as_ref(), token, now).into_result()?;
        account.clear_password_reset(now);
        Ok(())
    }
}
