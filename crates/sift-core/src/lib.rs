//! # sift-core
//!
//! Core engine for sift: embedding pipeline, vector index, retriever.
//!
//! This crate provides the domain logic for building and querying a
//! vector-based retrieval index over text nodes. Storage concerns live in
//! `sift-store`; the embedding model and the node parser are external
//! collaborators reached through traits.
//!
//! ## Main Types
//!
//! - [`VectorStoreIndex`] – the index itself: build pipeline and accessors
//! - [`VectorIndexRetriever`] – top-k retrieval with stale-reference skip
//! - [`IndexRegistry`] – entry-id ↔ node-id bookkeeping
//! - [`SiftError`] – domain-specific error type
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sift_core::{ServiceContext, VectorIndexOptions, VectorStoreIndex};
//!
//! let service = ServiceContext::new(Arc::new(my_provider));
//! let index = VectorStoreIndex::init(
//!     VectorIndexOptions::new()
//!         .with_nodes(nodes)
//!         .with_service(service),
//! )?;
//!
//! let query = index.service().unwrap().provider.embed("what is a cat?")?;
//! let results = index.as_retriever().retrieve(&query, 5)?;
//! ```

pub mod context;
pub mod embedding;
pub mod errors;
pub mod index;
pub mod node;
pub mod parser;
pub mod registry;
pub mod retriever;

pub use context::{ServiceContext, StorageContext};
pub use embedding::{
    embed_nodes, EmbedOptions, EmbeddingProvider, HashEmbeddingProvider, NoopProgress,
    ProgressObserver,
};
pub use errors::{SiftError, SiftResult};
pub use index::{VectorIndexOptions, VectorStoreIndex};
pub use node::{content_hash, ContentMode, Document, Node, NodeWithEmbedding};
pub use parser::{NodeParser, WholeDocumentParser};
pub use registry::IndexRegistry;
pub use retriever::{ScoredNode, VectorIndexRetriever};
