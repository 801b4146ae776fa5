//! In-memory ordered storage engine.
//!
//! Provides a fast, non-persistent engine backed by a `BTreeMap`, so prefix
//! scans see keys in the same byte order redb uses. Ideal for testing and
//! embedded use cases.

use super::backend::OrderedStore;
use anyhow::Result;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

/// In-memory ordered storage engine.
///
/// All data is lost when the last clone is dropped.
///
/// # Thread Safety
///
/// `MemoryStore` is `Clone`; clones share the same map behind a
/// `parking_lot::RwLock`, so readers proceed concurrently and writers are
/// serialized.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all entries from the store.
    pub fn clear(&self) {
        self.data.write().clear();
    }
}

impl OrderedStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn get_many(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>> {
        let data = self.data.read();
        Ok(keys.iter().map(|key| data.get(key).cloned()).collect())
    }

    fn insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> Result<bool> {
        Ok(self.data.write().remove(key).is_some())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let data = self.data.read();
        let entries = data
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(entries)
    }

    fn keys(&self) -> Result<Vec<Vec<u8>>> {
        Ok(self.data.read().keys().cloned().collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.data.read().len())
    }
}
