//! In-memory repositories for single-node deployments and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;
use tracing::debug;

use pawhaven_core::error::AppError;
use pawhaven_core::types::id::{AccountId, SessionId};
use pawhaven_entity::account::Account;
use pawhaven_entity::session::{Session, SessionActivity, SessionKey};

use super::repository::{AccountRepository, SessionRepository};

/// In-memory account store with a unique email index.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountRepository {
    accounts: Arc<DashMap<AccountId, Account>>,
    by_email: Arc<DashMap<String, AccountId>>,
}

impl MemoryAccountRepository {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts, deleted ones included.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AppError> {
        Ok(self.accounts.get(&id).map(|a| a.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let Some(id) = self.by_email.get(email).map(|id| *id) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn find_by_reset_digest(&self, digest: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .accounts
            .iter()
            .find(|a| {
                a.core
                    .password_reset
                    .as_ref()
                    .is_some_and(|r| r.digest == digest)
            })
            .map(|a| a.value().clone()))
    }

    async fn insert(&self, account: Account) -> Result<(), AppError> {
        match self.by_email.entry(account.core.email.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Email '{}' is already registered",
                account.core.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(account.id());
                self.accounts.insert(account.id(), account);
                Ok(())
            }
        }
    }

    async fn save(&self, account: &Account) -> Result<(), AppError> {
        let mut stored = self
            .accounts
            .get_mut(&account.id())
            .ok_or_else(|| AppError::not_found(format!("Account {} not found", account.id())))?;
        if stored.core.email != account.core.email {
            return Err(AppError::validation("Account email cannot be changed"));
        }
        *stored = account.clone();
        Ok(())
    }

    async fn update_login_state(
        &self,
        id: AccountId,
        attempts: u32,
        locked_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut stored = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Account {id} not found")))?;
        stored.apply_login_attempt(attempts, locked_until, now);
        Ok(())
    }
}

/// In-memory session store.
///
/// One map-level mutex guards every write, which makes `activate` atomic
/// with respect to every other operation.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
}

impl MemorySessionRepository {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active rows across all keys.
    pub async fn active_count(&self) -> usize {
        self.sessions
            .lock()
            .await
            .values()
            .filter(|s| s.is_active)
            .count()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn find_by_id(&self, id: SessionId) -> Result<Option<Session>, AppError> {
        Ok(self.sessions.lock().await.get(&id).cloned())
    }

    async fn find_active_by_key(&self, key: &SessionKey) -> Result<Option<Session>, AppError> {
        Ok(self
            .sessions
            .lock()
            .await
            .values()
            .find(|s| s.is_active && s.user_id == key.user_id && s.auth_entity == key.auth_entity)
            .cloned())
    }

    async fn find_by_refresh_digest(&self, digest: &str) -> Result<Option<Session>, AppError> {
        Ok(self
            .sessions
            .lock()
            .await
            .values()
            .find(|s| s.refresh.as_ref().is_some_and(|r| r.digest == digest))
            .cloned())
    }

    async fn activate(&self, session: Session) -> Result<Vec<SessionId>, AppError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&session.id) {
            return Err(AppError::conflict(format!(
                "Session {} already exists",
                session.id
            )));
        }

        let now = session.created_at;
        let mut deactivated = Vec::new();
        for existing in sessions.values_mut() {
            if existing.is_active
                && existing.user_id == session.user_id
                && existing.auth_entity == session.auth_entity
            {
                existing.deactivate(now);
                deactivated.push(existing.id);
            }
        }

        debug!(
            session_id = %session.id,
            replaced = deactivated.len(),
            "Session activated"
        );
        sessions.insert(session.id, session);
        Ok(deactivated)
    }

    async fn save(&self, session: &Session) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().await;
        let stored = sessions
            .get(&session.id)
            .ok_or_else(|| AppError::not_found(format!("Session {} not found", session.id)))?;

        if session.is_active && !stored.is_active {
            return Err(AppError::conflict(format!(
                "Session {} is no longer active",
                session.id
            )));
        }

        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn record_activity(
        &self,
        id: SessionId,
        activity: SessionActivity,
    ) -> Result<bool, AppError> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&id) {
            Some(session) if session.is_active => {
                session.record_activity(&activity);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn deactivate(&self, id: SessionId, now: DateTime<Utc>) -> Result<bool, AppError> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&id) {
            Some(session) if session.is_active => {
                session.deactivate(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Session>, AppError> {
        Ok(self
            .sessions
            .lock()
            .await
            .values()
            .filter(|s| s.is_sweepable(now))
            .cloned()
            .collect())
    }

    async fn list_by_key(&self, key: &SessionKey) -> Result<Vec<Session>, AppError> {
        let mut rows: Vec<Session> = self
            .sessions
            .lock()
            .await
            .values()
            .filter(|s| s.user_id == key.user_id && s.auth_entity == key.auth_entity)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.created_at);
        Ok(rows)
    }
}
