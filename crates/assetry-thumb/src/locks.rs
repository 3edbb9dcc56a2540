//! Per-key mutual exclusion.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Table of async mutexes keyed by string.
///
/// Entries are created on first use and never removed, so the table grows
/// with the number of distinct keys seen during the process lifetime. For
/// thumbnail derivation that is the number of distinct image sources ever
/// previewed, which is acceptable here; an LRU bound would be the hardening
/// if it ever is not.
#[derive(Debug, Default)]
pub struct LockTable {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// The guard is dropped when `f` completes, fails, or when the returned
    /// future is itself dropped (cancellation, timeout). Calls with different
    /// keys never wait on each other.
    pub async fn with_lock<F, Fut, T>(&self, key: &str, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.acquire(key).await;
        f().await
    }

    /// Lock `key` and hand back an owned guard.
    ///
    /// The guard can be moved into a blocking task, which keeps the key
    /// locked until that task is done even if the awaiting caller is gone.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        self.entry(key).lock_owned().await
    }

    /// Whether `key` is currently held.
    pub fn is_locked(&self, key: &str) -> bool {
        let entries = self.entries.lock().expect("lock table poisoned");
        entries
            .get(key)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Number of keys that have ever been locked.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("lock table poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut entries = self.entries.lock().expect("lock table poisoned");
        match entries.get(key) {
            Some(lock) => Arc::clone(lock),
            None => {
                let lock = Arc::new(AsyncMutex::new(()));
                entries.insert(key.to_string(), Arc::clone(&lock));
                lock
            }
        }
    }
}
