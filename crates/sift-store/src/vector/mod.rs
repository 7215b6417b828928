//! Vector store module for sift-store.
//!
//! ## Available Backends
//!
//! - [`SimpleVectorStore`]: in-memory linear-scan backend with JSONL
//!   persistence, for tests and small indexes.
//!
//! Production backends live outside this crate and implement
//! [`VectorStore`]; backends that cannot serialize fully inherit the
//! fail-fast `persist` default.

mod simple;
mod traits;

pub use simple::SimpleVectorStore;
pub use traits::{
    EntryId, MetadataFilter, MetadataFilters, VectorHit, VectorRecord, VectorStore,
};

/// Default filename for a persisted simple vector store.
pub const VECTORS_FILENAME: &str = "vectors.jsonl";
