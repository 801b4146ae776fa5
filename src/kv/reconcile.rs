//! Repair pass between the primary and index stores.
//!
//! `put` commits the two stores in separate transactions, so a crash or a
//! failed second write can leave them disagreeing. [`KvService::reconcile`]
//! brings them back to one index entry per primary record:
//!
//! - Index entries whose digest does not match their key are repointed at the
//!   right digest when that record exists, otherwise removed
//! - Index entries whose record is missing from the primary store are removed
//! - Primary records no index entry refers to are removed
//!
//! The cache is cleared afterwards.

use super::service::{KvService, StorePair};
use crate::digest::digest;
use crate::error::{Error, Result};
use anyhow::Context;
use std::collections::HashSet;

/// Counts of what a reconcile pass found and repaired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Index entries examined.
    pub scanned: usize,
    /// Index entries removed because their record was missing.
    pub dangling_index: usize,
    /// Index entries whose digest did not match their key.
    pub mismatched_index: usize,
    /// Primary records removed because nothing indexed them.
    pub orphaned_values: usize,
}

impl ReconcileReport {
    /// Returns true if the stores already agreed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dangling_index == 0 && self.mismatched_index == 0 && self.orphaned_values == 0
    }
}

impl KvService {
    /// Repairs disagreements between the primary and index stores.
    ///
    /// Holds the store lock exclusively for the whole pass, so no `put`,
    /// `get` or `iterate` runs concurrently. Scans both stores fully; run it
    /// on startup or during quiet periods.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reconcile`] if a storage operation fails part way (the
    /// repairs already applied stay applied), or [`Error::AlreadyClosed`].
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        let guard = self.inner.stores.write();
        let stores = guard.as_ref().ok_or(Error::AlreadyClosed)?;

        tracing::debug!("Reconciling KV stores");
        let report = reconcile_pair(stores).map_err(Error::Reconcile)?;
        self.inner.cache.lock().clear();

        if report.is_clean() {
            tracing::info!(scanned = report.scanned, "KV stores consistent");
        } else {
            tracing::info!(
                scanned = report.scanned,
                dangling_index = report.dangling_index,
                mismatched_index = report.mismatched_index,
                orphaned_values = report.orphaned_values,
                "Reconciled KV stores"
            );
        }

        Ok(report)
    }
}

fn reconcile_pair(stores: &StorePair) -> anyhow::Result<ReconcileReport> {
    let index_entries = stores
        .index
        .scan_prefix(&[])
        .context("Failed to scan index store")?;

    let mut report = ReconcileReport {
        scanned: index_entries.len(),
        ..ReconcileReport::default()
    };
    let mut referenced: HashSet<Vec<u8>> = HashSet::with_capacity(index_entries.len());

    // Phase 1: every index entry must point at its own key's digest, and
    // that record must exist.
    for (key, stored) in index_entries {
        let expected = digest(&key);
        let expected = expected.as_bytes();

        if stored.as_slice() != expected {
            report.mismatched_index += 1;
            let has_record = stores
                .primary
                .get(expected)
                .context("Failed to read primary store")?
                .is_some();

            if has_record {
                stores
                    .index
                    .insert(&key, expected)
                    .context("Failed to repoint index entry")?;
                referenced.insert(expected.to_vec());
            } else {
                stores
                    .index
                    .remove(&key)
                    .context("Failed to remove index entry")?;
            }
            continue;
        }

        let has_record = stores
            .primary
            .get(&stored)
            .context("Failed to read primary store")?
            .is_some();

        if has_record {
            referenced.insert(stored);
        } else {
            tracing::debug!(key = %String::from_utf8_lossy(&key), "Removing dangling index entry");
            report.dangling_index += 1;
            stores
                .index
                .remove(&key)
                .context("Failed to remove index entry")?;
        }
    }

    // Phase 2: drop records nothing points at.
    for record in stores.primary.keys().context("Failed to scan primary store")? {
        if !referenced.contains(&record) {
            report.orphaned_values += 1;
            stores
                .primary
                .remove(&record)
                .context("Failed to remove orphaned record")?;
        }
    }

    Ok(report)
}
