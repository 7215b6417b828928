//! Storage and service wiring.
//!
//! [`StorageContext`] bundles where things are kept (document store,
//! vector backend); [`ServiceContext`] bundles how things are computed
//! (embedding provider, node parser, fan-out options). Both are explicit
//! values handed to the index at construction; there are no
//! process-global defaults. Both stores sit behind trait objects, so any
//! [`DocStore`] and [`VectorStore`] implementation can be wired in.

use std::sync::Arc;

use tracing::debug;

use sift_store::{
    DocStore, PersistConfig, SimpleDocumentStore, SimpleKvStore, SimpleVectorStore, VectorStore,
    VECTORS_FILENAME,
};

use crate::embedding::{EmbedOptions, EmbeddingProvider, NoopProgress, ProgressObserver};
use crate::errors::SiftResult;
use crate::node::Node;
use crate::parser::{NodeParser, WholeDocumentParser};

/// Where an index keeps its nodes and vectors.
#[derive(Clone)]
pub struct StorageContext {
    /// Document store holding the nodes themselves.
    pub doc_store: Arc<dyn DocStore<Node>>,

    /// Vector backend holding the embeddings.
    pub vector_store: Arc<dyn VectorStore>,
}

impl StorageContext {
    /// Create a context from explicit stores.
    pub fn new(doc_store: Arc<dyn DocStore<Node>>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self {
            doc_store,
            vector_store,
        }
    }

    /// Default wiring: in-memory key-value store, in-memory vector store.
    pub fn default_in_memory() -> Self {
        Self::new(
            Arc::new(SimpleDocumentStore::new(SimpleKvStore::new())),
            Arc::new(SimpleVectorStore::new()),
        )
    }

    /// Persist both stores under the configured directory.
    ///
    /// Fails fast (nothing partial is written for that store) when either
    /// store does not support persistence.
    pub fn persist(&self, config: &PersistConfig) -> SiftResult<()> {
        debug!("Persisting storage context to {:?}", config.dir);
        self.doc_store.persist(&config.docstore_path())?;
        self.vector_store.persist(&config.dir.join(VECTORS_FILENAME))?;
        Ok(())
    }
}

impl std::fmt::Debug for StorageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageContext")
            .field("vector_store", &self.vector_store.name())
            .finish_non_exhaustive()
    }
}

/// How an index computes embeddings and nodes.
#[derive(Clone)]
pub struct ServiceContext {
    /// The embedding collaborator.
    pub provider: Arc<dyn EmbeddingProvider>,

    /// The chunking collaborator, used by the document-level entry point.
    pub parser: Arc<dyn NodeParser>,

    /// Fan-out options for batch embedding.
    pub embed: EmbedOptions,

    /// Progress sink for batch embedding.
    pub progress: Arc<dyn ProgressObserver>,
}

impl ServiceContext {
    /// Create a context around an embedding provider, with the trivial
    /// whole-document parser and default fan-out options.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            parser: Arc::new(WholeDocumentParser),
            embed: EmbedOptions::default(),
            progress: Arc::new(NoopProgress),
        }
    }

    /// Replace the node parser.
    pub fn with_parser(mut self, parser: Arc<dyn NodeParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Replace the embedding fan-out options.
    pub fn with_embed_options(mut self, embed: EmbedOptions) -> Self {
        self.embed = embed;
        self
    }

    /// Replace the progress observer.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = progress;
        self
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("embed", &self.embed)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use crate::embedding::HashEmbeddingProvider;
    use sift_store::{DocumentStore, KvStore, SimpleKvStore, Snapshot, StoreError, StoreResult};

    /// Key-value backend with no snapshot capability.
    struct VolatileKv {
        data: Mutex<Snapshot>,
    }

    impl VolatileKv {
        fn new() -> Self {
            Self {
                data: Mutex::new(Snapshot::new()),
            }
        }
    }

    impl KvStore for VolatileKv {
        fn name(&self) -> &'static str {
            "volatile"
        }

        fn put(&self, namespace: &str, key: &str, value: serde_json::Value) -> StoreResult<()> {
            self.data
                .lock()
                .unwrap()
                .entry(namespace.to_string())
                .or_default()
                .insert(key.to_string(), value);
            Ok(())
        }

        fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<serde_json::Value>> {
            Ok(self
                .data
                .lock()
                .unwrap()
                .get(namespace)
                .and_then(|ns| ns.get(key))
                .cloned())
        }

        fn delete(&self, namespace: &str, key: &str) -> StoreResult<bool> {
            Ok(self
                .data
                .lock()
                .unwrap()
                .get_mut(namespace)
                .map(|ns| ns.remove(key).is_some())
                .unwrap_or(false))
        }

        fn get_all(
            &self,
            namespace: &str,
        ) -> StoreResult<BTreeMap<String, serde_json::Value>> {
            Ok(self
                .data
                .lock()
                .unwrap()
                .get(namespace)
                .cloned()
                .unwrap_or_default())
        }
    }

    #[test]
    fn test_default_in_memory_wiring() {
        let storage = StorageContext::default_in_memory();
        assert_eq!(storage.vector_store.name(), "simple");
        assert!(storage.vector_store.is_empty().unwrap());
        assert!(storage.doc_store.docs().unwrap().is_empty());
    }

    #[test]
    fn test_persist_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = PersistConfig::new(dir.path().join("ctx"));

        let storage = StorageContext::default_in_memory();
        storage
            .doc_store
            .add_documents(&[Node::new("n1", "cat")], true)
            .unwrap();
        storage
            .vector_store
            .add(&[sift_store::VectorRecord::new("n1", vec![1.0, 0.0])])
            .unwrap();
        storage.persist(&config).unwrap();

        let doc_store: SimpleDocumentStore<Node> =
            DocumentStore::from_persist_dir(&config, None).unwrap();
        assert_eq!(doc_store.get_document("n1").unwrap().unwrap().content, "cat");

        let vectors =
            SimpleVectorStore::from_persist_path(&config.dir.join(VECTORS_FILENAME)).unwrap();
        assert_eq!(vectors.len().unwrap(), 1);
    }

    #[test]
    fn test_persist_fails_fast_on_unsupported_backend() {
        struct NoPersist;
        impl VectorStore for NoPersist {
            fn name(&self) -> &'static str {
                "no-persist"
            }
            fn add(
                &self,
                _records: &[sift_store::VectorRecord],
            ) -> sift_store::StoreResult<Vec<sift_store::EntryId>> {
                Ok(Vec::new())
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

        let dir = tempfile::tempdir().unwrap();
        let config = PersistConfig::new(dir.path());

        let storage = StorageContext::new(
            Arc::new(DocumentStore::new(SimpleKvStore::new())),
            Arc::new(NoPersist),
        );
        let err = storage.persist(&config).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::SiftError::Store(StoreError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_custom_kv_backend_can_be_wired() {
        let storage = StorageContext::new(
            Arc::new(DocumentStore::new(VolatileKv::new())),
            Arc::new(SimpleVectorStore::new()),
        );

        storage
            .doc_store
            .add_documents(&[Node::new("n1", "cat")], true)
            .unwrap();
        assert_eq!(
            storage
                .doc_store
                .get_document("n1")
                .unwrap()
                .unwrap()
                .content,
            "cat"
        );

        // The backend cannot snapshot, so context persistence fails fast.
        let dir = tempfile::tempdir().unwrap();
        let err = storage.persist(&PersistConfig::new(dir.path())).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::SiftError::Store(StoreError::Unsupported { ref backend, .. })
                if backend == "volatile"
        ));
    }

    #[test]
    fn test_service_context_builder() {
        let service = ServiceContext::new(Arc::new(HashEmbeddingProvider::new(8)))
            .with_embed_options(EmbedOptions::default().with_concurrency(2));
        assert_eq!(service.embed.concurrency, 2);
        assert_eq!(service.provider.dim(), 8);
    }
}
