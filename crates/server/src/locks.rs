//! Per-entity async mutual exclusion.
//!
//! Every case transition and every evidence analysis-state write runs while
//! holding the lock for that entity's id. Writes to different ids never wait
//! on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A lazily populated map of id → async mutex.
///
/// Entries are dropped again once nobody holds or waits on them.
#[derive(Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: i64) -> KeyGuard<'_> {
        let entry = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(key).or_default().clone()
        };
        let guard = entry.lock_owned().await;
        KeyGuard {
            locks: self,
            key,
            guard: Some(guard),
        }
    }

    /// Lock several keys in ascending order so concurrent callers cannot deadlock.
    pub async fn lock_many(&self, keys: &[i64]) -> Vec<KeyGuard<'_>> {
        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in sorted {
            guards.push(self.lock(key).await);
        }
        guards
    }

    /// Number of ids with a live entry.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Held while an entity is being written. Releases on drop.
pub struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: i64,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut map = self.locks.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = map.get(&self.key) {
            // Only the map's own reference left: no holder, no waiter.
            if Arc::strong_count(entry) == 1 {
                map.remove(&self.key);
            }
        }
    }
}
