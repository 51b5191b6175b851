use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use super::{Lock, LockError, LockManager};

/// Record lock built from a held flag and a condition variable.
#[derive(Default)]
pub struct InMemoryLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl InMemoryLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn held(&self) -> Result<MutexGuard<'_, bool>, LockError> {
        self.held
            .lock()
            .map_err(|e| LockError::Poisoned(e.to_string()))
    }
}

impl Lock for InMemoryLock {
    fn lock(&self) -> Result<(), LockError> {
        let mut held = self
            .released
            .wait_while(self.held()?, |held| *held)
            .map_err(|e| LockError::Poisoned(e.to_string()))?;
        *held = true;
        Ok(())
    }

    fn try_lock(&self) -> Result<bool, LockError> {
        let mut held = self.held()?;
        let acquired = !*held;
        *held = true;
        Ok(acquired)
    }

    fn unlock(&self) -> Result<(), LockError> {
        let mut held = self.held()?;
        if std::mem::replace(&mut *held, false) {
            self.released.notify_one();
        }
        Ok(())
    }
}

/// One [`InMemoryLock`] per record key in use. A lock leaves the table once
/// its last holder hands it back.
#[derive(Default)]
pub struct InMemoryLockManager {
    locks: Mutex<Table>,
}

type Table = HashMap<String, Arc<InMemoryLock>>;

impl InMemoryLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.lock().map_or(0, |locks| locks.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self, key: &str) -> Result<MutexGuard<'_, Table>, LockError> {
        self.locks
            .lock()
            .map_err(|_| LockError::Poisoned(format!("lock table (key {})", key)))
    }
}

impl LockManager for InMemoryLockManager {
    type Lock = InMemoryLock;

    fn get_lock(&self, key: &str) -> Result<Arc<InMemoryLock>, LockError> {
        let mut locks = self.table(key)?;
        let lock = locks.entry(key.to_string()).or_default();
        Ok(Arc::clone(lock))
    }

    fn release(&self, key: &str, lock: Arc<InMemoryLock>) -> Result<(), LockError> {
        drop(lock);
        let mut locks = self.table(key)?;
        // Only the table's own reference left.
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), LockError> {
        self.table("any")?.retain(|_, lock| Arc::strong_count(lock) > 1);
        Ok(())
    }
}
