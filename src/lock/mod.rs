//! Per-record write locks.
//!
//! Every write to a stored record goes through a lock obtained from a
//! [`LockManager`], keyed by `"project:type:id"`. Reads never take these
//! locks; they only serialize writers on the same record.

mod error;
mod in_memory;

pub use error::LockError;
pub use in_memory::{InMemoryLock, InMemoryLockManager};

use std::sync::Arc;

/// A single record lock.
pub trait Lock: Send + Sync {
    /// Block until the lock is held by the caller.
    fn lock(&self) -> Result<(), LockError>;

    /// `Ok(false)` when someone else holds it.
    fn try_lock(&self) -> Result<bool, LockError>;

    fn unlock(&self) -> Result<(), LockError>;
}

/// Hands out record locks. While anyone holds the lock for a key, the same
/// key yields the same lock.
pub trait LockManager: Send + Sync {
    type Lock: Lock;

    fn get_lock(&self, key: &str) -> Result<Arc<Self::Lock>, LockError>;

    /// Hand back a lock obtained from [`get_lock`](Self::get_lock). The
    /// manager may forget a lock nobody else holds.
    fn release(&self, key: &str, lock: Arc<Self::Lock>) -> Result<(), LockError>;

    /// Forget every lock not currently in use.
    fn clear(&self) -> Result<(), LockError>;
}

/// Holds a record lock until dropped, then hands it back to its manager.
pub struct LockGuard<'m, M: LockManager> {
    manager: &'m M,
    key: String,
    lock: Option<Arc<M::Lock>>,
}

impl<'m, M: LockManager> LockGuard<'m, M> {
    pub fn acquire(manager: &'m M, key: String) -> Result<Self, LockError> {
        let lock = manager.get_lock(&key)?;
        if let Err(err) = lock.lock() {
            if let Err(release) = manager.release(&key, lock) {
                tracing::error!(key = %key, error = %release, "failed to return record lock");
            }
            return Err(err);
        }
        Ok(Self {
            manager,
            key,
            lock: Some(lock),
        })
    }
}

impl<M: LockManager> Drop for LockGuard<'_, M> {
    fn drop(&mut self) {
        let Some(lock) = self.lock.take() else {
            return;
        };
        if let Err(err) = lock.unlock() {
            tracing::error!(key = %self.key, error = %err, "failed to release record lock");
        }
        if let Err(err) = self.manager.release(&self.key, lock) {
            tracing::error!(key = %self.key, error = %err, "failed to return record lock");
        }
    }
}

/// Build the lock key for a record.
pub fn record_key(project_key: &str, type_id: &str, id: &str) -> String {
    format!("{}:{}:{}", project_key, type_id, id)
}
