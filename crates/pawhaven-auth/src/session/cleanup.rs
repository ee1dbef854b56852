//! Expired session sweep.

use std::sync::Arc;

use tracing::{error, info};

use pawhaven_core::clock::Clock;
use pawhaven_core::types::id::AccountId;
use pawhaven_entity::session::SessionKey;

use crate::error::AuthResult;
use crate::store::{KeyedLock, SessionRepository};

use super::manager::SessionManager;

/// Deactivates sessions that can no longer be used and drops idle lock
/// entries.
#[derive(Clone)]
pub struct SessionCleanup {
    sessions: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
    session_locks: Arc<KeyedLock<SessionKey>>,
    account_locks: Option<Arc<KeyedLock<AccountId>>>,
}

impl std::fmt::Debug for SessionCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCleanup").finish()
    }
}

impl SessionCleanup {
    /// Creates a sweep over the manager's store and lock table.
    pub fn new(manager: &SessionManager) -> Self {
        Self {
            sessions: Arc::clone(manager.repository()),
            clock: Arc::clone(manager.clock()),
            session_locks: Arc::clone(manager.locks()),
            account_locks: None,
        }
    }

    /// Also prune a per-account lock table on every run.
    pub fn with_account_locks(mut self, locks: Arc<KeyedLock<AccountId>>) -> Self {
        self.account_locks = Some(locks);
        self
    }

    /// Runs a cleanup cycle.
    ///
    /// Returns the number of sessions deactivated.
    pub async fn run_cleanup(&self) -> AuthResult<u32> {
        let now = self.clock.now();
        let expired = self.sessions.find_expired(now).await?;

        let pruned = self.session_locks.prune()
            + self.account_locks.as_ref().map_or(0, |locks| locks.prune());

        if expired.is_empty() {
            return Ok(0);
        }

        info!(count = expired.len(), "Found expired sessions to clean up");

        let mut cleaned = 0u32;
        for session in &expired {
            let reason = if session.is_past_hard_expiry(now) {
                "Session lifetime expired"
            } else {
                "Tokens expired"
            };

            match self.sessions.deactivate(session.id, now).await {
                Ok(true) => {
                    cleaned += 1;
                    info!(session_id = %session.id, reason, "Session expired");
                }
                Ok(false) => {}
                Err(e) => {
                    error!(
                        session_id = %session.id,
                        error = %e,
                        "Failed to deactivate expired session"
                    );
                }
            }
        }

        info!(cleaned, pruned_locks = pruned, "Session cleanup completed");

        Ok(cleaned)
    }
}
