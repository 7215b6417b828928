//! Key-value store traits and core types.
//!
//! This module defines the abstraction all key-value backends implement,
//! plus the narrower snapshot capability that only fully serializable
//! backends provide.

use std::collections::BTreeMap;

use crate::error::{StoreError, StoreResult};

/// The full serialized state of a snapshot-capable store: namespace name
/// to a mapping of key to value.
pub type Snapshot = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// Core trait for key-value store backends.
///
/// A store is a flat collection of namespaces, each holding string keys
/// mapped to structured JSON values. `(namespace, key)` uniquely identifies
/// a record and writes are last-write-wins. Namespaces come into existence
/// on first write and never need pre-declaration.
///
/// ## Implementation Notes
///
/// - Backends should be thread-safe (implement `Send + Sync`), but the
///   contract does not require isolation between concurrent writers;
///   callers needing that must lock externally.
/// - Iteration order within a namespace is backend-defined and not
///   guaranteed to survive a persist/reload cycle.
pub trait KvStore: Send + Sync {
    /// Short backend name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Insert or overwrite a value. Overwrites silently.
    fn put(&self, namespace: &str, key: &str, value: serde_json::Value) -> StoreResult<()>;

    /// Look up a value. Returns `None` for an absent key or namespace.
    fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<serde_json::Value>>;

    /// Remove a key. Returns whether the key was present; deleting an
    /// absent key is not an error.
    fn delete(&self, namespace: &str, key: &str) -> StoreResult<bool>;

    /// Return every key/value pair in a namespace. An unknown namespace
    /// yields an empty map.
    fn get_all(&self, namespace: &str) -> StoreResult<BTreeMap<String, serde_json::Value>>;

    /// Deep-copy the full store state.
    ///
    /// Backends that cannot serialize fully keep this default body, which
    /// fails fast with [`StoreError::Unsupported`] instead of producing a
    /// partial snapshot.
    fn to_snapshot(&self) -> StoreResult<Snapshot> {
        Err(StoreError::unsupported(self.name(), "to_snapshot"))
    }
}

/// Capability trait for backends able to rebuild themselves from a
/// captured snapshot.
///
/// Dict-based loading is only offered where this trait is implemented,
/// so "can this store type be reconstructed from disk" is a compile-time
/// question rather than a runtime instance check. Implementors also
/// override [`KvStore::to_snapshot`].
pub trait SnapshotStore: KvStore + Sized {
    /// Rebuild a store from a previously captured snapshot.
    fn from_snapshot(snapshot: Snapshot) -> Self;
}
