//! Async wrappers for KV operations.
//!
//! These methods wrap the synchronous operations in `spawn_blocking` to
//! avoid blocking the async runtime. Use these when calling from async
//! contexts (HTTP handlers, etc.).

use serde::Serialize;
use serde_json::Value;

use super::reconcile::ReconcileReport;
use super::service::KvService;
use crate::error::{Error, Result};

impl KvService {
    /// Retrieves a value asynchronously.
    ///
    /// Async version of [`get_value`](Self::get_value) that uses `spawn_blocking`.
    pub async fn get_async(&self, key: String) -> Result<Value> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.get_value(&key))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }

    /// Stores a value asynchronously.
    ///
    /// Async version of [`put`](Self::put) that uses `spawn_blocking`.
    pub async fn put_async<V>(&self, key: String, value: V) -> Result<()>
    where
        V: Serialize + Send + 'static,
    {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.put(&key, &value))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }

    /// Scans a prefix asynchronously.
    ///
    /// Async version of [`iterate`](Self::iterate) that uses `spawn_blocking`.
    pub async fn iterate_async(&self, prefix: String) -> Result<Vec<(String, Value)>> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.iterate(&prefix))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }

    /// Runs the repair pass asynchronously.
    ///
    /// Async version of [`reconcile`](Self::reconcile) that uses `spawn_blocking`.
    pub async fn reconcile_async(&self) -> Result<ReconcileReport> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.reconcile())
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }
}
