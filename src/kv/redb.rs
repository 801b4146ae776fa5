//! Redb-backed ordered storage engine.
//!
//! Provides persistent, byte-ordered storage using redb with ACID guarantees
//! per transaction. One `RedbStore` wraps one database file and one named
//! table inside it.

use super::backend::OrderedStore;
use anyhow::{Context, Result};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition, TableHandle,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

type ByteTable = TableDefinition<'static, &'static [u8], &'static [u8]>;

/// Redb-backed ordered storage engine.
///
/// # Thread Safety
///
/// `RedbStore` is `Clone` and can be shared across threads. redb allows
/// concurrent readers and serializes writers internally.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
    table: ByteTable,
    path: PathBuf,
}

impl RedbStore {
    /// Opens or creates a redb database at `path` using `table`.
    ///
    /// Creates parent directories if needed and initializes the table so
    /// reads against a fresh file succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - Database file cannot be opened or created (permissions, locked by
    ///   another process, disk full)
    /// - Initialization transaction fails to begin or commit
    pub fn open<P: AsRef<Path>>(path: P, table: ByteTable) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory: {}", parent.display()))?;
        }

        let db = Database::create(path)
            .with_context(|| format!("Failed to open store database: {}", path.display()))?;

        let write_txn = db
            .begin_write()
            .context("Failed to begin initialization transaction")?;
        {
            let _table = write_txn
                .open_table(table)
                .with_context(|| format!("Failed to initialize table '{}'", table.name()))?;
        }
        write_txn
            .commit()
            .context("Failed to commit initialization transaction")?;

        tracing::debug!(path = %path.display(), table = table.name(), "Opened redb store");

        Ok(Self {
            db: Arc::new(db),
            table,
            path: path.to_path_buf(),
        })
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OrderedStore for RedbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(self.table)
            .with_context(|| format!("Failed to open table '{}'", self.table.name()))?;

        let value = table
            .get(key)
            .context("Failed to read entry")?
            .map(|guard| guard.value().to_vec());

        Ok(value)
    }

    fn get_many(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(self.table)
            .with_context(|| format!("Failed to open table '{}'", self.table.name()))?;

        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            let value = table
                .get(key.as_slice())
                .context("Failed to read entry")?
                .map(|guard| guard.value().to_vec());
            values.push(value);
        }

        Ok(values)
    }

    fn insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        {
            let mut table = write_txn
                .open_table(self.table)
                .with_context(|| format!("Failed to open table '{}'", self.table.name()))?;

            table.insert(key, value).context("Failed to insert entry")?;
        }

        write_txn
            .commit()
            .context("Failed to commit insert transaction")?;

        Ok(())
    }

    fn remove(&self, key: &[u8]) -> Result<bool> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;

        let removed = {
            let mut table = write_txn
                .open_table(self.table)
                .with_context(|| format!("Failed to open table '{}'", self.table.name()))?;

            table
                .remove(key)
                .context("Failed to remove entry")?
                .is_some()
        };

        write_txn
            .commit()
            .context("Failed to commit remove transaction")?;

        Ok(removed)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(self.table)
            .with_context(|| format!("Failed to open table '{}'", self.table.name()))?;

        let mut entries = Vec::new();
        for item in table.range(prefix..).context("Failed to seek table")? {
            let (key, value) = item.context("Failed to read entry")?;
            if !key.value().starts_with(prefix) {
                break;
            }
            entries.push((key.value().to_vec(), value.value().to_vec()));
        }

        Ok(entries)
    }

    fn keys(&self) -> Result<Vec<Vec<u8>>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(self.table)
            .with_context(|| format!("Failed to open table '{}'", self.table.name()))?;

        let mut keys = Vec::new();
        for item in table.iter().context("Failed to iterate table")? {
            let (key, _) = item.context("Failed to read entry")?;
            keys.push(key.value().to_vec());
        }

        Ok(keys)
    }

    fn len(&self) -> Result<usize> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(self.table)
            .with_context(|| format!("Failed to open table '{}'", self.table.name()))?;

        let count = table.len().context("Failed to count entries")?;
        usize::try_from(count).context("Entry count does not fit in usize")
    }
}
