//! Node and document model.
//!
//! A [`Node`] is the addressable unit of content an index works with; a
//! [`Document`] is the higher-level unit it was derived from, carrying a
//! content hash for change detection. An index only ever holds node
//! identifiers; the nodes themselves live in the document store and the
//! embeddings live in the vector backend.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sift_store::DocRecord;

/// Which content view of a node to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentMode {
    /// The view handed to the embedding model: the bare content string.
    Embed,
    /// The view shown to readers: metadata lines followed by the content.
    Display,
}

/// An addressable unit of content with a stable identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier.
    pub id: String,

    /// The content string.
    pub content: String,

    /// Free-form metadata (shown in `Display` mode only).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Id of the source document this node was derived from, if any.
    #[serde(default)]
    pub ref_doc_id: Option<String>,
}

impl Node {
    /// Create a node with required fields.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: BTreeMap::new(),
            ref_doc_id: None,
        }
    }

    /// Set the metadata map.
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the source document id.
    pub fn with_ref_doc_id(mut self, ref_doc_id: impl Into<String>) -> Self {
        self.ref_doc_id = Some(ref_doc_id.into());
        self
    }

    /// Produce the content view for `mode`.
    pub fn content(&self, mode: ContentMode) -> String {
        match mode {
            ContentMode::Embed => self.content.clone(),
            ContentMode::Display => {
                if self.metadata.is_empty() {
                    return self.content.clone();
                }
                let header: String = self
                    .metadata
                    .iter()
                    .map(|(k, v)| format!("{}: {}\n", k, v))
                    .collect();
                format!("{}\n{}", header, self.content)
            }
        }
    }
}

impl DocRecord for Node {
    fn doc_id(&self) -> &str {
        &self.id
    }
}

/// A source document: decomposes into one or more nodes (decomposition is
/// the node parser's job, not this type's).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier.
    pub id: String,

    /// Full document text.
    pub text: String,

    /// Fingerprint of `text`, used to detect whether re-derivation of the
    /// document's nodes is necessary.
    pub hash: String,

    /// Free-form metadata, copied onto derived nodes by the default parser.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document with an explicit id; the hash is computed from
    /// the text.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let hash = content_hash(&text);
        Self {
            id: id.into(),
            text,
            hash,
            metadata: BTreeMap::new(),
        }
    }

    /// Create a document with a generated id.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), text)
    }

    /// Set the metadata map.
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A transient pairing of a node and its embedding, produced by the
/// embedding step. Never persisted as its own entity: the vector goes to
/// the vector backend, the node to the document store.
#[derive(Debug, Clone)]
pub struct NodeWithEmbedding {
    /// The source node.
    pub node: Node,

    /// The embedding computed from the node's `Embed` content view.
    pub embedding: Vec<f32>,
}

/// Compute a stable fingerprint of document content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

// ============================================================================
// Tests
// ============================================================================
