//! Vector store index: construction options and the build pipeline.
//!
//! An index is created either from a raw node batch (which triggers the
//! embed → vector-backend → registry pipeline) or from a previously
//! persisted [`IndexRegistry`], never both. Construction is atomic: the
//! options are validated before any embedding work begins, and on failure
//! no partially built index is observable.

use tracing::{debug, warn};

use sift_store::VectorRecord;

use crate::context::{ServiceContext, StorageContext};
use crate::embedding::embed_nodes;
use crate::errors::{SiftError, SiftResult};
use crate::node::{Document, Node};
use crate::registry::IndexRegistry;
use crate::retriever::VectorIndexRetriever;

/// Construction options for [`VectorStoreIndex`].
///
/// Exactly one of `nodes` / `registry` must be supplied. `storage` and
/// `service` override the default wiring; `storage` defaults to the
/// in-memory stores, while an embedding provider has no default and must
/// come through `service` whenever nodes are to be embedded.
#[derive(Debug, Default)]
pub struct VectorIndexOptions {
    nodes: Option<Vec<Node>>,
    registry: Option<IndexRegistry>,
    storage: Option<StorageContext>,
    service: Option<ServiceContext>,
}

impl VectorIndexOptions {
    /// Start with empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from this node batch.
    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Adopt a previously built registry instead of building.
    pub fn with_registry(mut self, registry: IndexRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Override the default storage wiring.
    pub fn with_storage(mut self, storage: StorageContext) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Override the default service wiring.
    pub fn with_service(mut self, service: ServiceContext) -> Self {
        self.service = Some(service);
        self
    }
}

/// An index that stores nodes according to their vector embeddings.
///
/// Holds only identifiers in its registry: the nodes live in the
/// document store, the vectors in the vector backend. One builder
/// invocation logically owns the registry at a time; concurrent builds
/// into the same index must be serialized by the caller.
#[derive(Debug)]
pub struct VectorStoreIndex {
    registry: IndexRegistry,
    storage: StorageContext,
    service: Option<ServiceContext>,
}

impl VectorStoreIndex {
    /// Create an index from construction options.
    ///
    /// Fails with [`SiftError::Configuration`] before any embedding work
    /// when both `nodes` and `registry` are supplied, or neither.
    pub fn init(options: VectorIndexOptions) -> SiftResult<Self> {
        if options.nodes.is_some() && options.registry.is_some() {
            return Err(SiftError::configuration(
                "cannot initialize an index with both nodes and a prebuilt registry",
            ));
        }

        let storage = options
            .storage
            .unwrap_or_else(StorageContext::default_in_memory);

        if let Some(registry) = options.registry {
            debug!(
                "Opening index {} from prebuilt registry ({} entries)",
                registry.index_id(),
                registry.len()
            );
            return Ok(Self {
                registry,
                storage,
                service: options.service,
            });
        }

        let nodes = options.nodes.ok_or_else(|| {
            SiftError::configuration(
                "cannot initialize an index without nodes or a prebuilt registry",
            )
        })?;
        let service = options.service.ok_or_else(|| {
            SiftError::configuration(
                "building from nodes requires a service context with an embedding provider",
            )
        })?;

        let registry = Self::build_index_from_nodes(&nodes, &service, &storage)?;
        Ok(Self {
            registry,
            storage,
            service: Some(service),
        })
    }

    /// Run the build pipeline for a node batch.
    ///
    /// 1. Embed every node in the batch (no deduplication or caching).
    /// 2. Submit the full batch to the vector backend.
    /// 3. Register `(assigned id, node id)` pairs in input order into a
    ///    fresh registry, and upsert the nodes into the document store.
    ///
    /// Any embedding failure aborts the build with nothing mutated. If the
    /// backend rejects the batch, the computed embeddings are discarded and
    /// the registry is never touched; if the document-store upsert fails
    /// afterwards, the just-added vectors are removed again. Either way no
    /// orphaned vectors can exist.
    pub fn build_index_from_nodes(
        nodes: &[Node],
        service: &ServiceContext,
        storage: &StorageContext,
    ) -> SiftResult<IndexRegistry> {
        debug!("Building index from {} nodes", nodes.len());

        let embedded = embed_nodes(
            service.provider.as_ref(),
            nodes,
            &service.embed,
            service.progress.as_ref(),
        )?;

        let records: Vec<VectorRecord> = embedded
            .iter()
            .map(|nwe| {
                VectorRecord::new(nwe.node.id.clone(), nwe.embedding.clone())
                    .with_metadata(nwe.node.metadata.clone())
            })
            .collect();
        let assigned = storage
            .vector_store
            .add(&records)
            .map_err(|e| SiftError::backend(e.to_string()))?;
        if assigned.len() != records.len() {
            return Err(SiftError::backend(format!(
                "backend returned {} ids for {} records",
                assigned.len(),
                records.len()
            )));
        }

        let mut registry = IndexRegistry::new();
        for (entry_id, nwe) in assigned.iter().zip(&embedded) {
            registry.insert(entry_id, &nwe.node.id);
        }
        if let Err(err) = storage.doc_store.add_documents(nodes, true) {
            if let Err(cleanup) = storage.vector_store.delete(&assigned) {
                warn!(
                    "Failed to remove {} vectors after document store error: {}",
                    assigned.len(),
                    cleanup
                );
            }
            return Err(err.into());
        }

        debug!(
            "Built index {} with {} entries",
            registry.index_id(),
            registry.len()
        );
        Ok(registry)
    }

    /// High-level entry point: record document hashes, run the node
    /// parser, then build from the resulting nodes.
    ///
    /// The supplied options must not already carry `nodes` or a
    /// `registry`; they exist to override storage/service wiring.
    pub fn from_documents(
        documents: &[Document],
        options: VectorIndexOptions,
    ) -> SiftResult<Self> {
        if options.nodes.is_some() || options.registry.is_some() {
            return Err(SiftError::configuration(
                "from_documents supplies its own nodes; options may only carry wiring overrides",
            ));
        }

        let storage = options
            .storage
            .unwrap_or_else(StorageContext::default_in_memory);
        let service = options.service.ok_or_else(|| {
            SiftError::configuration(
                "from_documents requires a service context with an embedding provider",
            )
        })?;

        for doc in documents {
            storage.doc_store.set_document_hash(&doc.id, &doc.hash)?;
        }

        let nodes = service.parser.parse(documents)?;
        Self::init(
            VectorIndexOptions::new()
                .with_nodes(nodes)
                .with_storage(storage)
                .with_service(service),
        )
    }

    /// The index's bookkeeping registry.
    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// The index's storage wiring.
    pub fn storage(&self) -> &StorageContext {
        &self.storage
    }

    /// The index's service wiring, when it was built with one.
    pub fn service(&self) -> Option<&ServiceContext> {
        self.service.as_ref()
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// A retriever over this index.
    pub fn as_retriever(&self) -> VectorIndexRetriever<'_> {
        VectorIndexRetriever::new(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use crate::embedding::HashEmbeddingProvider;

    fn service() -> ServiceContext {
        ServiceContext::new(Arc::new(HashEmbeddingProvider::new(8)))
    }

    fn nodes(ids: &[&str]) -> Vec<Node> {
        ids.iter()
            .map(|id| Node::new(*id, format!("content of {}", id)))
            .collect()
    }

    #[test]
    fn test_init_with_both_is_configuration_error() {
        let err = VectorStoreIndex::init(
            VectorIndexOptions::new()
                .with_nodes(nodes(&["n1"]))
                .with_registry(IndexRegistry::new())
                .with_service(service()),
        )
        .unwrap_err();
        assert!(matches!(err, SiftError::Configuration { .. }));
    }

    #[test]
    fn test_init_with_neither_is_configuration_error() {
        let err = VectorStoreIndex::init(VectorIndexOptions::new().with_service(service()))
            .unwrap_err();
        assert!(matches!(err, SiftError::Configuration { .. }));
    }

    #[test]
    fn test_init_from_nodes_without_provider_is_configuration_error() {
        let err =
            VectorStoreIndex::init(VectorIndexOptions::new().with_nodes(nodes(&["n1"])))
                .unwrap_err();
        assert!(matches!(err, SiftError::Configuration { .. }));
    }

    #[test]
    fn test_build_registers_every_node_exactly_once() {
        let batch = nodes(&["n1", "n2", "n3", "n4", "n5"]);
        let index = VectorStoreIndex::init(
            VectorIndexOptions::new()
                .with_nodes(batch.clone())
                .with_service(service()),
        )
        .unwrap();

        assert_eq!(index.len(), batch.len());
        let registered: BTreeSet<&str> = index.registry().node_ids().collect();
        let expected: BTreeSet<&str> = batch.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(registered, expected);

        // Vector backend and registry agree.
        assert_eq!(
            index.storage().vector_store.len().unwrap(),
            index.registry().len()
        );

        // Nodes landed in the document store.
        for node in &batch {
            assert_eq!(
                index
                    .storage()
                    .doc_store
                    .get_document(&node.id)
                    .unwrap()
                    .unwrap(),
                *node
            );
        }
    }

    #[test]
    fn test_init_from_prebuilt_registry_does_not_embed() {
        let mut registry = IndexRegistry::new();
        registry.insert(&sift_store::EntryId::new("e1"), "n1");

        // No service context at all: loading a registry needs no provider.
        let index =
            VectorStoreIndex::init(VectorIndexOptions::new().with_registry(registry.clone()))
                .unwrap();
        assert_eq!(index.registry(), &registry);
        assert!(index.service().is_none());
    }

    #[test]
    fn test_backend_failure_leaves_no_orphans() {
        struct RejectingBackend;
        impl sift_store::VectorStore for RejectingBackend {
            fn name(&self) -> &'static str {
                "rejecting"
            }
            fn add(
                &self,
                _records: &[VectorRecord],
            ) -> sift_store::StoreResult<Vec<sift_store::EntryId>> {
                Err(sift_store::StoreError::internal("backend down"))
            }
            fn query(
                &self,
                _embedding: &[f32],
                _top_k: usize,
                _filters: Option<&sift_store::MetadataFilters>,
            ) -> sift_store::StoreResult<Vec<sift_store::VectorHit>> {
                Ok(Vec::new())
            }
            fn delete(&self, _ids: &[sift_store::EntryId]) -> sift_store::StoreResult<()> {
                Ok(())
            }
            fn len(&self) -> sift_store::StoreResult<usize> {
                Ok(0)
            }
        }

        let storage = StorageContext::new(
            Arc::new(sift_store::DocumentStore::new(
                sift_store::SimpleKvStore::new(),
            )),
            Arc::new(RejectingBackend),
        );
        let err = VectorStoreIndex::init(
            VectorIndexOptions::new()
                .with_nodes(nodes(&["n1"]))
                .with_storage(storage.clone())
                .with_service(service()),
        )
        .unwrap_err();
        assert!(matches!(err, SiftError::Backend { .. }));

        // Nothing was written to the document store either.
        assert!(storage.doc_store.docs().unwrap().is_empty());
    }

    #[test]
    fn test_doc_store_failure_removes_added_vectors() {
        use std::collections::BTreeMap;

        use sift_store::VectorStore;

        /// Key-value backend that rejects every write.
        struct ReadOnlyKv;

        impl sift_store::KvStore for ReadOnlyKv {
            fn name(&self) -> &'static str {
                "read-only"
            }
            fn put(
                &self,
                _namespace: &str,
                _key: &str,
                _value: serde_json::Value,
            ) -> sift_store::StoreResult<()> {
                Err(sift_store::StoreError::internal("store is read-only"))
            }
            fn get(
                &self,
                _namespace: &str,
                _key: &str,
            ) -> sift_store::StoreResult<Option<serde_json::Value>> {
                Ok(None)
            }
            fn delete(&self, _namespace: &str, _key: &str) -> sift_store::StoreResult<bool> {
                Ok(false)
            }
            fn get_all(
                &self,
                _namespace: &str,
            ) -> sift_store::StoreResult<BTreeMap<String, serde_json::Value>> {
                Ok(BTreeMap::new())
            }
        }

        let vector_store = Arc::new(sift_store::SimpleVectorStore::new());
        let storage = StorageContext::new(
            Arc::new(sift_store::DocumentStore::new(ReadOnlyKv)),
            vector_store.clone(),
        );

        let err = VectorStoreIndex::init(
            VectorIndexOptions::new()
                .with_nodes(nodes(&["n1", "n2"]))
                .with_storage(storage)
                .with_service(service()),
        )
        .unwrap_err();
        assert!(matches!(err, SiftError::Store(_)));

        // The vectors written before the failure were removed again.
        assert_eq!(vector_store.len().unwrap(), 0);
    }

    #[test]
    fn test_sequential_builds_do_not_share_state() {
        let batch = nodes(&["n1", "n2"]);

        let first = VectorStoreIndex::init(
            VectorIndexOptions::new()
                .with_nodes(batch.clone())
                .with_service(service()),
        )
        .unwrap();
        let second = VectorStoreIndex::init(
            VectorIndexOptions::new()
                .with_nodes(batch)
                .with_service(service()),
        )
        .unwrap();

        assert_ne!(first.registry().index_id(), second.registry().index_id());
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(first.storage().vector_store.len().unwrap(), 2);
        assert_eq!(second.storage().vector_store.len().unwrap(), 2);
    }

    #[test]
    fn test_from_documents_records_hashes_and_nodes() {
        let documents = vec![Document::new("d1", "cat"), Document::new("d2", "dog")];
        let index = VectorStoreIndex::from_documents(
            &documents,
            VectorIndexOptions::new().with_service(service()),
        )
        .unwrap();

        assert_eq!(index.len(), 2);
        let store = &index.storage().doc_store;
        assert_eq!(
            store.get_document_hash("d1").unwrap(),
            Some(documents[0].hash.clone())
        );
        assert_eq!(
            store.get_document("d1#0").unwrap().unwrap().content,
            "cat"
        );
    }

    #[test]
    fn test_from_documents_rejects_node_options() {
        let err = VectorStoreIndex::from_documents(
            &[Document::new("d1", "cat")],
            VectorIndexOptions::new()
                .with_nodes(nodes(&["n1"]))
                .with_service(service()),
        )
        .unwrap_err();
        assert!(matches!(err, SiftError::Configuration { .. }));
    }
}
