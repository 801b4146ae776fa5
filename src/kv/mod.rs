//! Cached, digest-addressed key-value store with a key-ordered index.
//!
//! Values are stored under the BLAKE3 digest of their key in a primary
//! store. A second index store maps each key to its digest so prefix scans
//! can still walk keys in lexicographic order. A bounded insertion-order
//! cache sits in front of both.
//!
//! Engines are pluggable through [`OrderedStore`]:
//!
//! - **RedbStore**: Persistent storage with ACID transactions (default)
//! - **MemoryStore**: Fast, non-persistent storage (ideal for testing/embedding)
//!
//! # Example
//!
//! ```ignore
//! use meshkv::config::KvConfig;
//! use meshkv::kv::KvService;
//!
//! // Persistent (production): two sibling redb files
//! let kv = KvService::open(&KvConfig::in_dir("/var/lib/meshkv"))?;
//! kv.put("ec:42", &escrow)?;
//! let pending = kv.iterate("ec:")?;
//! kv.close()?;
//!
//! // In-memory (testing/embedding)
//! let kv = KvService::memory();
//! ```
//!
//! # Custom Engines
//!
//! ```ignore
//! use meshkv::kv::{KvService, OrderedStore};
//!
//! struct SledStore { /* ... */ }
//! impl OrderedStore for SledStore { /* ... */ }
//!
//! let kv = KvService::with_stores(SledStore::new("a"), SledStore::new("b"), 30);
//! ```

mod async_ops;
mod backend;
mod cache;
mod memory;
mod reconcile;
mod redb;
mod service;

#[cfg(test)]
mod property_tests;

// Re-export the public API
pub use backend::OrderedStore;
pub use cache::RecencyCache;
pub use memory::MemoryStore;
pub use reconcile::ReconcileReport;
pub use self::redb::RedbStore;
pub use service::KvService;
