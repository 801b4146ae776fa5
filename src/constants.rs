//! Shared constants for the meshkv store.
//!
//! Centralizes defaults so the config layer, the service, and the tests agree
//! on cache sizing, file names, and table names.

use redb::TableDefinition;

/// Default number of decoded values held by the recency cache.
pub const DEFAULT_CACHE_SIZE: usize = 30;

/// Cache sizes above this trigger a validation warning.
pub const MAX_RECOMMENDED_CACHE_SIZE: usize = 10_000;

/// Hard upper bound on the cache size accepted from configuration.
pub const MAX_CACHE_SIZE: usize = 1_000_000;

/// Default file name of the primary (digest-keyed) store.
pub const DEFAULT_PRIMARY_FILE: &str = "meshkv.redb";

/// Default file name of the index (key-ordered) store.
pub const DEFAULT_INDEX_FILE: &str = "meshkv_index.redb";

/// Default config file name inside the meshkv home directory.
pub const DEFAULT_CONFIG_FILE: &str = "meshkv.toml";

/// Environment variable overriding the meshkv home directory.
pub const HOME_ENV_VAR: &str = "MESHKV_HOME";

/// Digest -> serialized value.
pub const VALUES_TABLE: TableDefinition<'static, &'static [u8], &'static [u8]> =
    TableDefinition::new("values");

/// Logical key -> digest.
pub const INDEX_TABLE: TableDefinition<'static, &'static [u8], &'static [u8]> =
    TableDefinition::new("index");
