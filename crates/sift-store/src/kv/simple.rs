//! Simple in-memory key-value store with JSON file persistence.
//!
//! This is the default backend: all namespaces live in memory and the full
//! store can be flushed to (or loaded from) a single JSON document. It is
//! the only bundled backend that implements [`SnapshotStore`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use tracing::debug;

use super::traits::{KvStore, Snapshot, SnapshotStore};
use super::{read_snapshot, write_snapshot};
use crate::error::{StoreError, StoreResult};

/// In-memory key-value store, persistable as a single JSON document.
///
/// The on-disk format maps namespace names to mappings of key to value:
///
/// ```json
/// { "docstore/data": { "n1": { ... } }, "docstore/metadata": { "d1": "h1" } }
/// ```
#[derive(Debug, Default)]
pub struct SimpleKvStore {
    data: RwLock<Snapshot>,
}

impl SimpleKvStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the entire store to a JSON document at `path`.
    ///
    /// Overwrites any existing file and creates parent directories as
    /// needed. The snapshot reflects whatever state is current when the
    /// call is made; callers must not mutate concurrently.
    pub fn persist(&self, path: &Path) -> StoreResult<()> {
        debug!("Persisting SimpleKvStore to {:?}", path);
        let data = self.read_guard()?;
        write_snapshot(path, &data)
    }

    /// Load a store from a previously persisted JSON document.
    ///
    /// Fails with [`StoreError::NotFound`] if `path` does not exist and
    /// with [`StoreError::Parse`] if the file is not well-formed.
    pub fn from_persist_path(path: &Path) -> StoreResult<Self> {
        debug!("Loading SimpleKvStore from {:?}", path);
        Ok(Self::from_snapshot(read_snapshot(path)?))
    }

    fn read_guard(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Snapshot>> {
        self.data
            .read()
            .map_err(|e| StoreError::internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_guard(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Snapshot>> {
        self.data
            .write()
            .map_err(|e| StoreError::internal(format!("Failed to acquire write lock: {}", e)))
    }
}

impl KvStore for SimpleKvStore {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn put(&self, namespace: &str, key: &str, value: serde_json::Value) -> StoreResult<()> {
        let mut data = self.write_guard()?;
        data.entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<serde_json::Value>> {
        let data = self.read_guard()?;
        Ok(data.get(namespace).and_then(|ns| ns.get(key)).cloned())
    }

    fn delete(&self, namespace: &str, key: &str) -> StoreResult<bool> {
        let mut data = self.write_guard()?;
        Ok(data
            .get_mut(namespace)
            .map(|ns| ns.remove(key).is_some())
            .unwrap_or(false))
    }

    fn get_all(&self, namespace: &str) -> StoreResult<BTreeMap<String, serde_json::Value>> {
        let data = self.read_guard()?;
        Ok(data.get(namespace).cloned().unwrap_or_default())
    }

    fn to_snapshot(&self) -> StoreResult<Snapshot> {
        let data = self.read_guard()?;
        Ok(data.clone())
    }
}

impl SnapshotStore for SimpleKvStore {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            data: RwLock::new(snapshot),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
