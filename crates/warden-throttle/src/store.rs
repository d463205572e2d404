//! Attempt-record persistence.
//!
//! Stores must make [`AttemptStore::update`] an atomic read-modify-write:
//! two concurrent failures for the same identity must both be counted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use warden_types::Identity;

use crate::error::StoreError;
use crate::record::AttemptRecord;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable storage for attempt records keyed by identity.
pub trait AttemptStore: Send + Sync {
    /// Reads the record for `identity`, if any.
    fn load(&self, identity: &Identity) -> StoreResult<Option<AttemptRecord>>;

    /// Atomically replaces the record for `identity` with `apply(current)`.
    ///
    /// Returning `None` from `apply` deletes the record. No other update for
    /// the same identity may interleave between the read and the write.
    /// Returns the value written.
    fn update(
        &self,
        identity: &Identity,
        apply: &mut dyn FnMut(Option<AttemptRecord>) -> Option<AttemptRecord>,
    ) -> StoreResult<Option<AttemptRecord>>;

    /// Returns every stored record.
    fn list(&self) -> StoreResult<Vec<AttemptRecord>>;

    /// Deletes the record for `identity`. Returns whether one existed.
    fn remove(&self, identity: &Identity) -> StoreResult<bool> {
        let mut existed = false;
        self.update(identity, &mut |current| {
            existed = current.is_some();
            None
        })?;
        Ok(existed)
    }
}

impl<T: AttemptStore + ?Sized> AttemptStore for Arc<T> {
    fn load(&self, identity: &Identity) -> StoreResult<Option<AttemptRecord>> {
        (**self).load(identity)
    }

    fn update(
        &self,
        identity: &Identity,
        apply: &mut dyn FnMut(Option<AttemptRecord>) -> Option<AttemptRecord>,
    ) -> StoreResult<Option<AttemptRecord>> {
        (**self).update(identity, apply)
    }

    fn list(&self) -> StoreResult<Vec<AttemptRecord>> {
        (**self).list()
    }
}

/// In-memory store. Records do not survive the process.
#[derive(Debug, Default)]
pub struct MemoryAttemptStore {
    records: Mutex<HashMap<Identity, AttemptRecord>>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttemptStore for MemoryAttemptStore {
    fn load(&self, identity: &Identity) -> StoreResult<Option<AttemptRecord>> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(identity).cloned())
    }

    fn update(
        &self,
        identity: &Identity,
        apply: &mut dyn FnMut(Option<AttemptRecord>) -> Option<AttemptRecord>,
    ) -> StoreResult<Option<AttemptRecord>> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        let next = apply(records.get(identity).cloned());
        match &next {
            Some(record) => {
                records.insert(identity.clone(), record.clone());
            }
            None => {
                records.remove(identity);
            }
        }
        Ok(next)
    }

    fn list(&self) -> StoreResult<Vec<AttemptRecord>> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        let mut all: Vec<AttemptRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn bump(store: &dyn AttemptStore, identity: &Identity) {
        store
            .update(identity, &mut |current| {
                let mut record = current.unwrap_or_else(|| AttemptRecord::new(identity.clone()));
                record.fail_count += 1;
                Some(record)
            })
            .unwrap();
    }

    #[test]
    fn test_update_and_load() {
        let store = MemoryAttemptStore::new();
        let identity = Identity::new("ana@example.com");

        assert!(store.load(&identity).unwrap().is_none());
        bump(&store, &identity);
        bump(&store, &identity);
        assert_eq!(store.load(&identity).unwrap().unwrap().fail_count, 2);
    }

    #[test]
    fn test_remove() {
        let store = MemoryAttemptStore::new();
        let identity = Identity::new("ana@example.com");

        assert!(!store.remove(&identity).unwrap());
        bump(&store, &identity);
        assert!(store.remove(&identity).unwrap());
        assert!(store.load(&identity).unwrap().is_none());
    }

    #[test]
    fn test_list_is_sorted() {
        let store = MemoryAttemptStore::new();
        bump(&store, &Identity::new("zoe@example.com"));
        bump(&store, &Identity::new("ana@example.com"));

        let identities: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.identity.to_string())
            .collect();
        assert_eq!(identities, vec!["ana@example.com", "zoe@example.com"]);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let store = Arc::new(MemoryAttemptStore::new());
        let identity = Identity::new("ana@example.com");
        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let identity = identity.clone();
                thread::spawn(move || {
                    barrier.wait();
                    bump(store.as_ref(), &identity);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            store.load(&identity).unwrap().unwrap().fail_count,
            threads as u32
        );
    }
}
