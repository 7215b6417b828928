//! # sift-store
//!
//! Storage layer for sift - key-value persistence, document storage, and
//! vector backends.
//!
//! This crate provides the infrastructure implementations that are isolated
//! from the retrieval logic in `sift-core`. By separating these concerns:
//!
//! - Key-value and vector backends can be swapped without touching the
//!   index core
//! - Testing is easy with the bundled in-memory backends
//!
//! ## Architecture
//!
//! ```text
//! sift-core → (KvStore / VectorStore traits)
//!     ↑
//!  sift-store (SimpleKvStore, DocumentStore, SimpleVectorStore)
//! ```
//!
//! ## Modules
//!
//! - `kv`: key-value store trait, snapshot capability, default JSON-file
//!   backend
//! - `docstore`: document store composed over a key-value backend
//! - `vector`: vector store contract and the simple reference backend
//!
//! ## Usage
//!
//! ```ignore
//! use sift_store::kv::SimpleKvStore;
//! use sift_store::docstore::DocumentStore;
//!
//! let store = DocumentStore::new(SimpleKvStore::new());
//! store.add_documents(&nodes, true)?;
//! store.persist(&config.docstore_path())?;
//! ```

pub mod docstore;
pub mod error;
pub mod kv;
pub mod vector;

pub use docstore::{DocRecord, DocStore, DocumentStore, SimpleDocumentStore, DEFAULT_NAMESPACE};
pub use error::{StoreError, StoreResult};
pub use kv::{
    read_snapshot, write_snapshot, KvStore, PersistConfig, SimpleKvStore, Snapshot, SnapshotStore,
    DOCSTORE_FILENAME,
};
pub use vector::{
    EntryId, MetadataFilter, MetadataFilters, SimpleVectorStore, VectorHit, VectorRecord,
    VectorStore, VECTORS_FILENAME,
};
