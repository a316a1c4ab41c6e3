//! Keyed mutual exclusion
//!
//! `KeyedLocks` hands out one mutex per key (account id, transaction id) so
//! operations on the same entity serialize while operations on different
//! entities proceed in parallel. Slots are created on demand in a `DashMap`.

use crate::core::context::OperationContext;
use crate::types::LedgerError;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;

/// One mutex per key
#[derive(Debug)]
pub struct KeyedLocks<K>
where
    K: Eq + Hash,
{
    slots: DashMap<K, Arc<Mutex<()>>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Ord + Clone,
{
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Run `f` while holding the locks for every key in `keys`
    ///
    /// Keys are deduplicated and acquired in ascending order, so callers
    /// locking overlapping key sets cannot deadlock. When the context has a
    /// deadline, waiting for a lock gives up at that deadline.
    ///
    /// # Errors
    ///
    /// `Timeout`/`Cancelled` if the context expires before all locks are
    /// held; otherwise whatever `f` returns.
    pub fn with_locked<R>(
        &self,
        keys: &[K],
        ctx: &OperationContext,
        f: impl FnOnce() -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let mutexes: Vec<Arc<Mutex<()>>> = keys.iter().map(|key| self.slot(key)).collect();

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in &mutexes {
            ctx.check("acquire lock")?;
            let guard = match ctx.deadline() {
                Some(deadline) => mutex
                    .try_lock_until(deadline)
                    .ok_or_else(|| LedgerError::timeout("acquire lock"))?,
                None => mutex.lock(),
            };
            guards.push(guard);
        }

        let result = f();
        drop(guards);
        result
    }

    /// Forget the slot for `key`
    ///
    /// Only call once the entity is gone; a holder of the old slot keeps
    /// its own mutex alive until it finishes.
    pub fn remove(&self, key: &K) {
        self.slots.remove(key);
    }

    /// Number of keys that currently have a slot
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, key: &K) -> Arc<Mutex<()>> {
        Arc::clone(
            &self
                .slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash + Ord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
