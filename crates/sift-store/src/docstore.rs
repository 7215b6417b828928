//! Document store built on a key-value backend.
//!
//! The store composes a [`KvStore`] rather than extending one: behavior
//! never depends on a particular backend's representation. Two reserved
//! namespaces are derived from a caller-supplied prefix, one for the
//! serialized documents themselves and one for content hashes used in
//! change detection. Consumers that must stay backend-agnostic depend on
//! the object-safe [`DocStore`] trait instead of the concrete type.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::kv::{
    read_snapshot, write_snapshot, KvStore, PersistConfig, SimpleKvStore, Snapshot, SnapshotStore,
};

/// Default namespace prefix for document stores.
pub const DEFAULT_NAMESPACE: &str = "docstore";

/// A record the document store can hold: serializable and self-identifying.
pub trait DocRecord: Serialize + DeserializeOwned {
    /// Stable identifier this record is keyed by.
    fn doc_id(&self) -> &str;
}

/// Backend-agnostic document store operations.
///
/// Object-safe seam for consumers that take "some document store" without
/// naming the key-value backend behind it. `persist` goes through the
/// backend's runtime snapshot capability and fails fast with
/// [`StoreError::Unsupported`] for backends that cannot serialize fully.
pub trait DocStore<D: DocRecord>: Send + Sync {
    /// Upsert a batch of documents; see [`DocumentStore::add_documents`].
    fn add_documents(&self, docs: &[D], allow_update: bool) -> StoreResult<()>;

    /// Fetch a document by id.
    fn get_document(&self, id: &str) -> StoreResult<Option<D>>;

    /// Whether a document with this id is stored.
    fn document_exists(&self, id: &str) -> StoreResult<bool>;

    /// Record the content hash for a document id.
    fn set_document_hash(&self, id: &str, hash: &str) -> StoreResult<()>;

    /// Fetch the recorded content hash for a document id.
    fn get_document_hash(&self, id: &str) -> StoreResult<Option<String>>;

    /// Remove a document; see [`DocumentStore::delete_document`].
    fn delete_document(&self, id: &str, remove_ref_doc_node: bool) -> StoreResult<bool>;

    /// All stored documents, keyed by id.
    fn docs(&self) -> StoreResult<BTreeMap<String, D>>;

    /// Serialize the backing store to a JSON document at `path`.
    fn persist(&self, path: &Path) -> StoreResult<()>;
}

/// Key-value-backed document store.
///
/// Generic over the backend `S` and the record type `D`. Typed loading
/// (`from_snapshot`, `from_persist_path`) exists only where `S` implements
/// [`SnapshotStore`], so a store over a backend that cannot be rebuilt
/// from disk simply has no load path; there is no runtime check that
/// could silently ship partial state.
pub struct DocumentStore<S: KvStore, D: DocRecord> {
    kv: S,
    namespace: String,
    data_ns: String,
    meta_ns: String,
    _record: PhantomData<fn() -> D>,
}

/// Document store over the default [`SimpleKvStore`] backend.
pub type SimpleDocumentStore<D> = DocumentStore<SimpleKvStore, D>;

impl<S: KvStore, D: DocRecord> DocumentStore<S, D> {
    /// Create a store over `kv` under the default namespace prefix.
    pub fn new(kv: S) -> Self {
        Self::with_namespace(kv, DEFAULT_NAMESPACE)
    }

    /// Create a store over `kv` under an explicit namespace prefix.
    pub fn with_namespace(kv: S, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let data_ns = format!("{}/data", namespace);
        let meta_ns = format!("{}/metadata", namespace);
        Self {
            kv,
            namespace,
            data_ns,
            meta_ns,
            _record: PhantomData,
        }
    }

    /// The namespace prefix this store writes under.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Upsert a batch of documents.
    ///
    /// With `allow_update` false, a document whose id is already present
    /// fails the call with [`StoreError::DuplicateKey`]; documents earlier
    /// in the batch stay written (writes are per-record, not transactional).
    pub fn add_documents(&self, docs: &[D], allow_update: bool) -> StoreResult<()> {
        debug!("Adding {} documents to `{}`", docs.len(), self.data_ns);

        for doc in docs {
            let id = doc.doc_id();
            if !allow_update && self.document_exists(id)? {
                return Err(StoreError::duplicate_key(self.data_ns.as_str(), id));
            }
            self.kv.put(&self.data_ns, id, serde_json::to_value(doc)?)?;
        }
        Ok(())
    }

    /// Fetch a document by id.
    pub fn get_document(&self, id: &str) -> StoreResult<Option<D>> {
        match self.kv.get(&self.data_ns, id)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Whether a document with this id is stored.
    pub fn document_exists(&self, id: &str) -> StoreResult<bool> {
        Ok(self.kv.get(&self.data_ns, id)?.is_some())
    }

    /// Record the content hash for a document id.
    pub fn set_document_hash(&self, id: &str, hash: &str) -> StoreResult<()> {
        self.kv
            .put(&self.meta_ns, id, serde_json::Value::String(hash.to_string()))
    }

    /// Fetch the recorded content hash for a document id.
    pub fn get_document_hash(&self, id: &str) -> StoreResult<Option<String>> {
        Ok(self
            .kv
            .get(&self.meta_ns, id)?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    /// Remove a document.
    ///
    /// `remove_ref_doc_node` also removes the content-hash entry recorded
    /// under the same id; the cascade is always the caller's explicit
    /// choice. Returns whether the document itself was present.
    pub fn delete_document(&self, id: &str, remove_ref_doc_node: bool) -> StoreResult<bool> {
        let removed = self.kv.delete(&self.data_ns, id)?;
        if remove_ref_doc_node {
            self.kv.delete(&self.meta_ns, id)?;
        }
        Ok(removed)
    }

    /// All stored documents, keyed by id.
    pub fn docs(&self) -> StoreResult<BTreeMap<String, D>> {
        let mut out = BTreeMap::new();
        for (id, value) in self.kv.get_all(&self.data_ns)? {
            out.insert(id, serde_json::from_value(value)?);
        }
        Ok(out)
    }

    /// Serialize the backing store to a JSON document at `path`.
    ///
    /// Fails with [`StoreError::Unsupported`] when the backend cannot
    /// snapshot its full state.
    pub fn persist(&self, path: &Path) -> StoreResult<()> {
        write_snapshot(path, &self.kv.to_snapshot()?)
    }

    /// Deep-copy the backing store's full state.
    pub fn to_snapshot(&self) -> StoreResult<Snapshot> {
        self.kv.to_snapshot()
    }
}

impl<S: KvStore, D: DocRecord> DocStore<D> for DocumentStore<S, D> {
    fn add_documents(&self, docs: &[D], allow_update: bool) -> StoreResult<()> {
        DocumentStore::add_documents(self, docs, allow_update)
    }

    fn get_document(&self, id: &str) -> StoreResult<Option<D>> {
        DocumentStore::get_document(self, id)
    }

    fn document_exists(&self, id: &str) -> StoreResult<bool> {
        DocumentStore::document_exists(self, id)
    }

    fn set_document_hash(&self, id: &str, hash: &str) -> StoreResult<()> {
        DocumentStore::set_document_hash(self, id, hash)
    }

    fn get_document_hash(&self, id: &str) -> StoreResult<Option<String>> {
        DocumentStore::get_document_hash(self, id)
    }

    fn delete_document(&self, id: &str, remove_ref_doc_node: bool) -> StoreResult<bool> {
        DocumentStore::delete_document(self, id, remove_ref_doc_node)
    }

    fn docs(&self) -> StoreResult<BTreeMap<String, D>> {
        DocumentStore::docs(self)
    }

    fn persist(&self, path: &Path) -> StoreResult<()> {
        DocumentStore::persist(self, path)
    }
}

impl<S: SnapshotStore, D: DocRecord> DocumentStore<S, D> {
    /// Rebuild a store from a snapshot, under an optional namespace prefix.
    pub fn from_snapshot(snapshot: Snapshot, namespace: Option<&str>) -> Self {
        Self::with_namespace(
            S::from_snapshot(snapshot),
            namespace.unwrap_or(DEFAULT_NAMESPACE),
        )
    }

    /// Load a store from a previously persisted JSON document.
    pub fn from_persist_path(path: &Path, namespace: Option<&str>) -> StoreResult<Self> {
        Ok(Self::from_snapshot(read_snapshot(path)?, namespace))
    }

    /// Load a store from the default filename inside a persistence directory.
    pub fn from_persist_dir(config: &PersistConfig, namespace: Option<&str>) -> StoreResult<Self> {
        Self::from_persist_path(&config.docstore_path(), namespace)
    }
}

// ============================================================================
// Tests
// ============================================================================
