//! Per-key async mutual exclusion.

use std::{hash::Hash, sync::Arc};

use {
    dashmap::DashMap,
    tokio::sync::{Mutex, OwnedMutexGuard},
};

/// Idle slots are pruned once the map grows past this many keys.
const PRUNE_THRESHOLD: usize = 1024;

/// Hands out one async mutex per key, so work on the same chat (or link)
/// is serialized while different keys proceed in parallel.
pub struct KeyedLocks<K: Eq + Hash> {
    slots: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        if self.slots.len() > PRUNE_THRESHOLD {
            self.prune();
        }
        let slot = Arc::clone(&self.slots.entry(key).or_default());
        slot.lock_owned().await
    }

    /// Drop slots nobody holds or waits on.
    pub fn prune(&self) {
        self.slots.retain(|_, slot| Arc::strong_count(slot) > 1);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::time::Duration};

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = KeyedLocks::new();
        let guard = locks.lock(1_i64).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.lock(1)).await;
        assert!(second.is_err(), "second lock on the same key must wait");
        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.lock(1)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock(1_i64).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock(2)).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn prune_drops_idle_slots_only() {
        let locks = KeyedLocks::new();
        let held = locks.lock(1_i64).await;
        drop(locks.lock(2).await);
        assert_eq!(locks.len(), 2);
        locks.prune();
        assert_eq!(locks.len(), 1);
        drop(held);
        locks.prune();
        assert!(locks.is_empty());
    }
}
