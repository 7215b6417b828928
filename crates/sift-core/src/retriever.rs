//! Top-k retrieval over a vector store index.
//!
//! The retriever asks the backend for the nearest entries, resolves them
//! through the index registry back to nodes in the document store, and
//! returns them in the backend's order without re-ranking. An id that no
//! longer resolves (a stale reference) is skipped with a warning rather
//! than failing the query; that skip is the crate's single designed
//! degrade-gracefully path.

use tracing::{trace, warn};

use sift_store::MetadataFilters;

use crate::errors::{SiftError, SiftResult};
use crate::index::VectorStoreIndex;
use crate::node::Node;

/// A retrieved node with its backend similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredNode {
    /// The resolved node.
    pub node: Node,

    /// Backend score; higher is more similar.
    pub score: f32,
}

/// Retriever over one [`VectorStoreIndex`].
pub struct VectorIndexRetriever<'a> {
    index: &'a VectorStoreIndex,
}

impl<'a> VectorIndexRetriever<'a> {
    /// Create a retriever for an index.
    pub fn new(index: &'a VectorStoreIndex) -> Self {
        Self { index }
    }

    /// Return up to `top_k` nodes for a query embedding, ranked by the
    /// backend.
    ///
    /// `top_k` larger than the number of indexed entries returns all
    /// available entries; an empty index returns an empty list.
    pub fn retrieve(&self, query_embedding: &[f32], top_k: usize) -> SiftResult<Vec<ScoredNode>> {
        self.retrieve_with_filters(query_embedding, top_k, None)
    }

    /// Like [`retrieve`](Self::retrieve), restricted to entries whose
    /// metadata matches `filters`.
    pub fn retrieve_with_filters(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filters: Option<&MetadataFilters>,
    ) -> SiftResult<Vec<ScoredNode>> {
        trace!("Retrieving top {} entries", top_k);

        let hits = self
            .index
            .storage()
            .vector_store
            .query(query_embedding, top_k, filters)
            .map_err(|e| SiftError::backend(e.to_string()))?;

        let registry = self.index.registry();
        let doc_store = &self.index.storage().doc_store;

        let mut out = Vec::with_capacity(hits.len());
        for hit in hits {
            let Some(node_id) = registry.node_id_for(&hit.id) else {
                warn!("Skipping stale entry `{}`: not in index registry", hit.id);
                continue;
            };
            match doc_store.get_document(node_id)? {
                Some(node) => out.push(ScoredNode {
                    node,
                    score: hit.score,
                }),
                None => {
                    warn!(
                        "Skipping stale entry `{}`: node `{}` missing from document store",
                        hit.id, node_id
                    );
                }
            }
        }

        trace!("Retrieved {} nodes", out.len());
        Ok(out)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::context::ServiceContext;
    use crate::embedding::{EmbeddingProvider, HashEmbeddingProvider};
    use crate::index::VectorIndexOptions;

    fn build_index(contents: &[&str]) -> VectorStoreIndex {
        let nodes: Vec<Node> = contents
            .iter()
            .enumerate()
            .map(|(i, c)| Node::new(format!("n{}", i), *c))
            .collect();
        VectorStoreIndex::init(
            VectorIndexOptions::new()
                .with_nodes(nodes)
                .with_service(ServiceContext::new(Arc::new(HashEmbeddingProvider::new(16)))),
        )
        .unwrap()
    }

    fn query_for(text: &str) -> Vec<f32> {
        HashEmbeddingProvider::new(16).embed(text).unwrap()
    }

    #[test]
    fn test_exact_content_is_top_hit() {
        let index = build_index(&["cat", "dog", "fish"]);
        let results = index.as_retriever().retrieve(&query_for("dog"), 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].node.content, "dog");
        assert!((results[0].score - 1.0).abs() < 1e-5);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_top_k_larger_than_index_returns_all() {
        let index = build_index(&["a", "b", "c"]);
        let results = index.as_retriever().retrieve(&query_for("a"), 50).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let index = VectorStoreIndex::init(
            VectorIndexOptions::new().with_registry(crate::registry::IndexRegistry::new()),
        )
        .unwrap();
        let results = index.as_retriever().retrieve(&query_for("x"), 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_filters_restrict_retrieval_by_node_metadata() {
        use std::collections::BTreeMap;

        let mut en = BTreeMap::new();
        en.insert("lang".to_string(), "en".to_string());
        let mut de = BTreeMap::new();
        de.insert("lang".to_string(), "de".to_string());

        let nodes = vec![
            Node::new("n0", "cat").with_metadata(en),
            Node::new("n1", "cat facts").with_metadata(de),
        ];
        let index = VectorStoreIndex::init(
            VectorIndexOptions::new()
                .with_nodes(nodes)
                .with_service(ServiceContext::new(Arc::new(HashEmbeddingProvider::new(16)))),
        )
        .unwrap();

        let filters = MetadataFilters::new().with_filter("lang", "de");
        let results = index
            .as_retriever()
            .retrieve_with_filters(&query_for("cat"), 2, Some(&filters))
            .unwrap();

        // The exact match carries `en` metadata and is excluded.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].node.id, "n1");
    }

    #[test]
    fn test_stale_docstore_reference_is_skipped() {
        let index = build_index(&["cat", "dog"]);

        // Simulate a node vanishing from the document store after indexing.
        index
            .storage()
            .doc_store
            .delete_document("n1", true)
            .unwrap();

        let results = index.as_retriever().retrieve(&query_for("dog"), 2).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].node.content, "cat");
    }

    #[test]
    fn test_stale_registry_reference_is_skipped() {
        let nodes = vec![Node::new("n0", "cat")];
        let service = ServiceContext::new(Arc::new(HashEmbeddingProvider::new(16)));
        let storage = crate::context::StorageContext::default_in_memory();

        // Populate the backend, then discard the registry that knows about
        // it: an index opened with an empty registry over the same backend
        // sees every hit as stale.
        VectorStoreIndex::build_index_from_nodes(&nodes, &service, &storage).unwrap();
        let index = VectorStoreIndex::init(
            VectorIndexOptions::new()
                .with_registry(crate::registry::IndexRegistry::new())
                .with_storage(storage),
        )
        .unwrap();

        let results = index.as_retriever().retrieve(&query_for("cat"), 1).unwrap();
        assert!(results.is_empty());
    }
}
