//! Cached, digest-addressed KV service over a pair of ordered stores.
//!
//! Values live in the primary store under `digest(key)`; the index store maps
//! each logical key to that digest so prefix scans can walk keys in order.
//! A bounded insertion-order cache sits in front of both.

use super::backend::OrderedStore;
use super::cache::RecencyCache;
use super::memory::MemoryStore;
use super::redb::RedbStore;
use crate::config::KvConfig;
use crate::constants::{self, INDEX_TABLE, VALUES_TABLE};
use crate::digest::{Digest, digest};
use crate::error::{Error, Result};
use anyhow::Context;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// The two durable engines owned by one service.
pub(crate) struct StorePair {
    /// Digest -> serialized value.
    pub(crate) primary: Arc<dyn OrderedStore>,
    /// Logical key -> digest.
    pub(crate) index: Arc<dyn OrderedStore>,
}

impl StorePair {
    /// Commits the value, then the index entry, as two separate transactions.
    fn write(&self, key: &str, digest: &Digest, encoded: &[u8]) -> anyhow::Result<()> {
        self.primary
            .insert(digest.as_bytes(), encoded)
            .context("Primary store write failed")?;
        self.index
            .insert(key.as_bytes(), digest.as_bytes())
            .context("Index store write failed")?;
        Ok(())
    }
}

/// Cache plus a counter bumped by every write.
///
/// A reader that misses the cache remembers the generation it saw and only
/// fills the cache if no write landed in between.
pub(crate) struct CacheState {
    pub(crate) entries: RecencyCache<Value>,
    pub(crate) generation: u64,
}

impl CacheState {
    fn store(&mut self, key: &str, value: Value) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(evicted) = self.entries.insert(key, value) {
            tracing::trace!(key = %evicted, "Evicted from cache");
        }
    }

    /// Caches a value read from disk unless a write happened since `seen`.
    fn fill(&mut self, key: &str, value: Value, seen: u64) {
        if self.generation != seen {
            return;
        }
        if let Some(evicted) = self.entries.insert(key, value) {
            tracing::trace!(key = %evicted, "Evicted from cache");
        }
    }

    fn invalidate(&mut self, key: &str) {
        self.generation = self.generation.wrapping_add(1);
        self.entries.remove(key);
    }

    pub(crate) fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.entries.clear();
    }
}

/// Internal state for the KV service.
pub(crate) struct KvServiceInner {
    pub(crate) cache: Mutex<CacheState>,
    /// `None` once closed.
    pub(crate) stores: RwLock<Option<StorePair>>,
    /// Serializes `put` so cache order matches durable commit order.
    write_lock: Mutex<()>,
}

/// Embedded key-value service.
///
/// Stores JSON-encoded values under the digest of their key, keeps a
/// key-ordered index for prefix scans, and caches recently inserted values.
///
/// # Lifecycle
///
/// Construct with [`open`](Self::open) (redb files), [`memory`](Self::memory)
/// or [`with_stores`](Self::with_stores); use; then [`close`](Self::close).
/// Clones are handles to the same instance, so closing through any handle
/// closes all of them. Every operation after `close` fails with
/// [`Error::AlreadyClosed`].
///
/// # Consistency
///
/// `put` commits the primary record and the index entry in two separate
/// transactions. If the second fails, the value is readable by `get` but
/// invisible to `iterate` until the key is written again or
/// [`reconcile`](Self::reconcile) removes it.
///
/// # Example
///
/// ```
/// use meshkv::kv::KvService;
///
/// # fn main() -> meshkv::Result<()> {
/// let kv = KvService::memory();
/// kv.put("ec:1", "first")?;
/// kv.put("ec:2", "second")?;
/// kv.put("other:1", "third")?;
///
/// let name: String = kv.get("ec:1")?;
/// assert_eq!(name, "first");
///
/// let keys: Vec<_> = kv.iterate("ec:")?.into_iter().map(|(k, _)| k).collect();
/// assert_eq!(keys, ["ec:1", "ec:2"]);
///
/// kv.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct KvService {
    pub(crate) inner: Arc<KvServiceInner>,
}

impl KvService {
    /// Opens both redb store files named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or either store file
    /// cannot be opened (missing permissions, locked by another process).
    pub fn open(config: &KvConfig) -> Result<Self> {
        let validation = config
            .validate()
            .map_err(|e| Error::Config(format!("{e:#}")))?;
        for warning in &validation.warnings {
            tracing::warn!("{warning}");
        }

        let primary = RedbStore::open(&config.path, VALUES_TABLE)
            .map_err(|e| Error::open(&config.path, e))?;
        let index = RedbStore::open(&config.index_path, INDEX_TABLE)
            .map_err(|e| Error::open(&config.index_path, e))?;

        tracing::info!(
            path = %config.path.display(),
            index_path = %config.index_path.display(),
            cache_size = config.cache_size,
            "Opened KV store"
        );

        Ok(Self::with_stores(primary, index, config.cache_size))
    }

    /// Creates a service over two fresh in-memory stores.
    ///
    /// All data is lost when the service is closed or dropped.
    pub fn memory() -> Self {
        Self::with_stores(
            MemoryStore::new(),
            MemoryStore::new(),
            constants::DEFAULT_CACHE_SIZE,
        )
    }

    /// Creates a service over custom engines.
    pub fn with_stores<P, I>(primary: P, index: I, cache_size: usize) -> Self
    where
        P: OrderedStore,
        I: OrderedStore,
    {
        Self {
            inner: Arc::new(KvServiceInner {
                cache: Mutex::new(CacheState {
                    entries: RecencyCache::new(cache_size),
                    generation: 0,
                }),
                stores: RwLock::new(Some(StorePair {
                    primary: Arc::new(primary),
                    index: Arc::new(index),
                })),
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Retrieves the decoded JSON value stored under `key`.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyKey`] if `key` is empty
    /// - [`Error::NotFound`] if nothing is stored under `key`
    /// - [`Error::Read`] / [`Error::Decode`] on storage or encoding failures
    /// - [`Error::AlreadyClosed`] after [`close`](Self::close)
    pub fn get_value(&self, key: &str) -> Result<Value> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }

        let guard = self.inner.stores.read();
        let stores = guard.as_ref().ok_or(Error::AlreadyClosed)?;

        let generation = {
            let cache = self.inner.cache.lock();
            if let Some(value) = cache.entries.lookup(key) {
                tracing::trace!(key, "Cache hit");
                return Ok(value);
            }
            cache.generation
        };

        let raw = stores
            .primary
            .get(digest(key).as_bytes())
            .map_err(|e| Error::read(key, e))?
            .ok_or_else(|| Error::not_found(key))?;

        let value: Value = serde_json::from_slice(&raw).map_err(|source| Error::Decode {
            key: key.to_string(),
            source,
        })?;

        self.inner.cache.lock().fill(key, value.clone(), generation);
        Ok(value)
    }

    /// Retrieves the value stored under `key`, deserialized as `V`.
    ///
    /// # Errors
    ///
    /// Same as [`get_value`](Self::get_value), plus [`Error::Decode`] if the
    /// stored JSON does not match `V`.
    pub fn get<V: DeserializeOwned>(&self, key: &str) -> Result<V> {
        let value = self.get_value(key)?;
        serde_json::from_value(value).map_err(|source| Error::Decode {
            key: key.to_string(),
            source,
        })
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// The cache is updated first; if either durable write fails the cache
    /// entry is dropped again so it never serves an unpersisted value.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyKey`] / [`Error::EmptyValue`] before anything is touched
    /// - [`Error::Encode`] if `value` cannot be serialized
    /// - [`Error::Write`] if the primary or index write fails
    /// - [`Error::AlreadyClosed`] after [`close`](Self::close)
    pub fn put<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> Result<()> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }

        let value = serde_json::to_value(value).map_err(|source| Error::Encode {
            key: key.to_string(),
            source,
        })?;
        if is_empty_value(&value) {
            return Err(Error::EmptyValue);
        }

        let encoded = serde_json::to_vec(&value).map_err(|source| Error::Encode {
            key: key.to_string(),
            source,
        })?;
        let digest = digest(key);

        let guard = self.inner.stores.read();
        let stores = guard.as_ref().ok_or(Error::AlreadyClosed)?;
        let _write = self.inner.write_lock.lock();

        self.inner.cache.lock().store(key, value.clone());

        if let Err(source) = stores.write(key, &digest, &encoded) {
            self.inner.cache.lock().invalidate(key);
            tracing::warn!(key, digest = %digest, error = %format!("{source:#}"), "KV write failed");
            return Err(Error::write(key, value.to_string(), source));
        }

        tracing::debug!(key, digest = %digest, bytes = encoded.len(), "Stored value");
        Ok(())
    }

    /// Returns every `(key, value)` whose key starts with `prefix`, in key order.
    ///
    /// An empty prefix matches every key. Index entries whose value is
    /// missing from the primary store are skipped.
    ///
    /// # Errors
    ///
    /// - [`Error::Read`] on storage failures
    /// - [`Error::CorruptIndex`] if an indexed key is not valid UTF-8
    /// - [`Error::Decode`] if a stored value is not valid JSON
    /// - [`Error::AlreadyClosed`] after [`close`](Self::close)
    pub fn iterate(&self, prefix: &str) -> Result<Vec<(String, Value)>> {
        let guard = self.inner.stores.read();
        let stores = guard.as_ref().ok_or(Error::AlreadyClosed)?;

        let entries = stores
            .index
            .scan_prefix(prefix.as_bytes())
            .map_err(|e| Error::read(prefix, e))?;

        let (keys, digests): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        let values = stores
            .primary
            .get_many(&digests)
            .map_err(|e| Error::read(prefix, e))?;

        let mut results = Vec::with_capacity(keys.len());
        for (key, raw) in keys.into_iter().zip(values) {
            let key = decode_key(key)?;
            let Some(raw) = raw else {
                tracing::warn!(key, "Index entry has no stored value, skipping");
                continue;
            };
            let value = serde_json::from_slice(&raw).map_err(|source| Error::Decode {
                key: key.clone(),
                source,
            })?;
            results.push((key, value));
        }

        tracing::debug!(prefix, count = results.len(), "Iterated prefix");
        Ok(results)
    }

    /// Returns the indexed keys starting with `prefix`, in key order.
    ///
    /// Reads only the index store; values are not fetched or decoded.
    ///
    /// # Errors
    ///
    /// Same as [`iterate`](Self::iterate), minus decode errors.
    pub fn iterate_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let guard = self.inner.stores.read();
        let stores = guard.as_ref().ok_or(Error::AlreadyClosed)?;

        stores
            .index
            .scan_prefix(prefix.as_bytes())
            .map_err(|e| Error::read(prefix, e))?
            .into_iter()
            .map(|(key, _)| decode_key(key))
            .collect()
    }

    /// Checks whether a value is stored under `key`.
    ///
    /// Does not fill the cache.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyKey`], [`Error::Read`] or [`Error::AlreadyClosed`].
    pub fn contains(&self, key: &str) -> Result<bool> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }

        let guard = self.inner.stores.read();
        let stores = guard.as_ref().ok_or(Error::AlreadyClosed)?;

        if self.inner.cache.lock().entries.contains(key) {
            return Ok(true);
        }

        let found = stores
            .primary
            .get(digest(key).as_bytes())
            .map_err(|e| Error::read(key, e))?
            .is_some();
        Ok(found)
    }

    /// Clears the cache and releases both store handles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyClosed`] if the service was already closed.
    pub fn close(&self) -> Result<()> {
        let stores = self
            .inner
            .stores
            .write()
            .take()
            .ok_or(Error::AlreadyClosed)?;

        self.inner.cache.lock().clear();
        drop(stores);

        tracing::info!("Closed KV store");
        Ok(())
    }

    /// Returns true once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.inner.stores.read().is_none()
    }

    /// Number of values currently cached.
    pub fn cache_len(&self) -> usize {
        self.inner.cache.lock().entries.len()
    }

    /// Returns true if `key` is currently cached.
    pub fn is_cached(&self, key: &str) -> bool {
        self.inner.cache.lock().entries.contains(key)
    }
}

/// `null`, `""`, `[]` and `{}` count as empty; numbers and booleans never do.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn decode_key(raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw).map_err(|e| Error::corrupt_index(format!("key is not valid UTF-8: {e}")))
}
