//! Ordered storage engine trait.
//!
//! Defines the interface the KV service consumes from its durable engines,
//! enabling pluggable storage (redb, memory, test doubles).

use anyhow::Result;

/// A byte-keyed, byte-ordered key-value engine.
///
/// Each method runs as one short-lived transaction: reads see a consistent
/// snapshot, writes are committed before the method returns. Implementations
/// must be thread-safe (`Send + Sync`) and allow concurrent readers.
///
/// # Example
///
/// ```ignore
/// use meshkv::kv::{MemoryStore, OrderedStore};
///
/// let store = MemoryStore::new();
/// store.insert(b"ec:1", b"payload")?;
/// let hits = store.scan_prefix(b"ec:")?;
/// ```
pub trait OrderedStore: Send + Sync + 'static {
    /// Retrieves the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Retrieves several values from a single read snapshot.
    ///
    /// The result has one slot per requested key, in request order.
    /// The default implementation calls [`get`](Self::get) per key, which
    /// does not share a snapshot; engines with transactions should override.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn get_many(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be committed.
    fn insert(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Removes `key`.
    ///
    /// Returns `Ok(true)` if the key existed, `Ok(false)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be committed.
    fn remove(&self, key: &[u8]) -> Result<bool>;

    /// Returns every entry whose key starts with `prefix`, in key order.
    ///
    /// Implementations seek to the first key `>= prefix` and stop at the
    /// first key that no longer matches. An empty prefix returns everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Returns every key in order, without copying values.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn keys(&self) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .scan_prefix(&[])?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }

    /// Returns the number of stored entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn len(&self) -> Result<usize>;

    /// Returns true if the store holds no entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
