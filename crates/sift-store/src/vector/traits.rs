//! Vector store contract and core types.
//!
//! The index core depends on backends only through [`VectorStore`]; it
//! never computes similarity itself and makes no assumption about the
//! backend's metric beyond "higher score = more similar, ties broken by a
//! backend-defined but stable order".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Backend-assigned identifier for one stored vector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    /// Create an entry id from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A vector to insert into a backend, paired with the node it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Caller-chosen id; `None` asks the backend to assign one.
    #[serde(default)]
    pub id: Option<EntryId>,

    /// The embedding vector.
    pub embedding: Vec<f32>,

    /// Id of the source node this vector was computed from.
    pub node_id: String,

    /// Metadata of the source node, used for query-time filtering.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl VectorRecord {
    /// Create a record with a backend-assigned id.
    pub fn new(node_id: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: None,
            embedding,
            node_id: node_id.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Pin the entry id instead of letting the backend assign one.
    pub fn with_id(mut self, id: impl Into<EntryId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach the source node's metadata for query-time filtering.
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One exact-match condition on record metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Metadata key to test.
    pub key: String,

    /// Value the key must hold exactly.
    pub value: String,
}

/// A conjunction of exact-match metadata conditions.
///
/// A record matches when every condition holds; an empty filter set
/// matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilters {
    /// The conditions, all of which must hold.
    pub filters: Vec<MetadataFilter>,
}

impl MetadataFilters {
    /// Start with no conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exact-match condition.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(MetadataFilter {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Whether the given metadata satisfies every condition.
    pub fn matches(&self, metadata: &BTreeMap<String, String>) -> bool {
        self.filters
            .iter()
            .all(|f| metadata.get(&f.key).map_or(false, |v| v == &f.value))
    }
}

/// A single result from a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    /// Id of the matched vector.
    pub id: EntryId,

    /// Similarity score; higher is more similar.
    pub score: f32,
}

impl VectorHit {
    /// Create a hit.
    pub fn new(id: impl Into<EntryId>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
        }
    }
}

/// Core trait for vector storage backends.
///
/// ## Implementation Notes
///
/// - Backends should be thread-safe (implement `Send + Sync`).
/// - `query` returns results ranked best-first; asking for more results
///   than are stored returns everything rather than failing.
/// - Upsert semantics: inserting a record whose id already exists replaces
///   the stored vector.
pub trait VectorStore: Send + Sync {
    /// Short backend name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Insert or update vectors; returns the assigned ids in input order.
    fn add(&self, records: &[VectorRecord]) -> StoreResult<Vec<EntryId>>;

    /// Query for the `top_k` most similar vectors, ranked best-first.
    ///
    /// `filters` restricts candidates to records whose metadata matches;
    /// `None` considers every record.
    fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        filters: Option<&MetadataFilters>,
    ) -> StoreResult<Vec<VectorHit>>;

    /// Delete vectors by id. Unknown ids are ignored.
    fn delete(&self, ids: &[EntryId]) -> StoreResult<()>;

    /// Number of stored vectors.
    fn len(&self) -> StoreResult<usize>;

    /// Whether the backend holds no vectors.
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Serialize the backend's state to `path`.
    ///
    /// Backends that cannot serialize fully keep this default body, which
    /// fails fast with [`StoreError::Unsupported`] instead of writing a
    /// partial file.
    fn persist(&self, path: &std::path::Path) -> StoreResult<()> {
        let _ = path;
        Err(StoreError::unsupported(self.name(), "persist"))
    }
}

// ============================================================================
// Tests
// ============================================================================
