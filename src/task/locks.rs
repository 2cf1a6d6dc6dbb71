//! Per-key async locks.
//!
//! Used to serialise writers per board (position writes) and per task
//! directory (attachment writes) while unrelated keys proceed in parallel.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Dead entries are purged every this many acquisitions.
const CLEANUP_INTERVAL: usize = 64;

/// Map size below which cleanup is skipped.
const CLEANUP_THRESHOLD: usize = 128;

/// Lock map handing out one async mutex per key.
///
/// Entries are held as `Weak` references, so a key's mutex lives only while
/// a guard for it exists.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Weak<AsyncMutex<()>>>>,
    acquire_counter: AtomicUsize,
}

/// Guard returned by [`KeyedLocks::acquire`]; the key is released on drop.
#[derive(Debug)]
pub struct KeyedGuard {
    _guard: OwnedMutexGuard<()>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            acquire_counter: AtomicUsize::new(0),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Ord + Clone,
{
    /// Creates an empty lock map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn acquire(&self, key: &K) -> KeyedGuard {
        let mutex = self.mutex_for(key);
        KeyedGuard {
            _guard: mutex.lock_owned().await,
        }
    }

    /// Waits for exclusive access to every key.
    ///
    /// Keys are deduplicated and locked in ascending order so two callers
    /// locking overlapping sets cannot deadlock.
    pub async fn acquire_all(&self, keys: impl IntoIterator<Item = K>) -> Vec<KeyedGuard> {
        let mut ordered: Vec<K> = keys.into_iter().collect();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for key in &ordered {
            guards.push(self.acquire(key).await);
        }
        guards
    }

    fn mutex_for(&self, key: &K) -> Arc<AsyncMutex<()>> {
        let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        let mutex = map.get(key).and_then(Weak::upgrade).unwrap_or_else(|| {
            let created = Arc::new(AsyncMutex::new(()));
            map.insert(key.clone(), Arc::downgrade(&created));
            created
        });

        let tick = self.acquire_counter.fetch_add(1, Ordering::Relaxed);
        if map.len() > CLEANUP_THRESHOLD && tick.is_multiple_of(CLEANUP_INTERVAL) {
            map.retain(|_, entry| entry.strong_count() > 0);
        }
        mutex
    }
}
