//! Process-local key-value backend.

use std::sync::{Arc, Mutex, MutexGuard};

use hashbrown::HashMap;

use super::{KeyValueStore, PersistError, PersistResult};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, String>,
    fail_writes: bool,
    writes: usize,
}

/// Shared in-memory store. Clones see the same entries, so a test can keep
/// one clone to inspect what the adapter wrote through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryKvStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    /// Writes a raw value, bypassing failure injection.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.lock()
            .entries
            .insert(key.to_string(), value.to_string());
    }

    /// Makes every subsequent `set` fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> PersistResult<()> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(PersistError::Message(format!("write to {key} rejected")));
        }
        inner.entries.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PersistResult<()> {
        self.lock().entries.remove(key);
        Ok(())
    }
}
