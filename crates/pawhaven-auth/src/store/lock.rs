//! Per-key async mutual exclusion with an acquisition timeout.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{AuthError, AuthResult};

/// A table of async mutexes, one per key.
///
/// Holding the returned guard serialises every other `acquire` for the same
/// key. Entries are created on demand and removed by [`KeyedLock::prune`]
/// once nobody holds or waits on them.
pub struct KeyedLock<K> {
    locks: DashMap<K, Arc<Mutex<()>>>,
    timeout: Duration,
}

impl<K> KeyedLock<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty lock table.
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Waits for the key's lock. Gives up with
    /// [`AuthError::ConcurrencyConflict`] after the configured timeout.
    pub async fn acquire(&self, key: &K) -> AuthResult<OwnedMutexGuard<()>> {
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        tokio::time::timeout(self.timeout, mutex.lock_owned())
            .await
            .map_err(|_| AuthError::ConcurrencyConflict)
    }

    /// Drops idle entries. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        before.saturating_sub(self.locks.len())
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash> fmt::Debug for KeyedLock<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLock")
            .field("keys", &self.locks.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}
