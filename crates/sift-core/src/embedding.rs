//! Embedding provider abstraction and the batch embedding fan-out.
//!
//! The embedding model itself is an external collaborator: the core only
//! depends on the [`EmbeddingProvider`] trait. [`embed_nodes`] runs a
//! whole node batch through a provider with bounded concurrency and
//! deterministic input-order reassembly, reporting progress through a
//! [`ProgressObserver`] rather than printing.
//!
//! Failure semantics: any single embedding failure fails the entire batch;
//! no partial result is ever returned.

use rayon::prelude::*;
use tracing::debug;

use crate::errors::{SiftError, SiftResult};
use crate::node::{ContentMode, Node, NodeWithEmbedding};

/// Collaborator contract: text in, vector out.
///
/// Failures are fatal to the enclosing build or query call; the core never
/// retries.
pub trait EmbeddingProvider: Send + Sync {
    /// Dimension of the vectors this provider produces.
    fn dim(&self) -> usize;

    /// Compute the embedding for one text.
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Observer for batch embedding progress.
pub trait ProgressObserver: Send + Sync {
    /// Called after each completed slice of the batch.
    fn on_progress(&self, completed: usize, total: usize);
}

/// Observer that ignores all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Options for the embedding fan-out.
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    /// Upper bound on embeddings in flight at once.
    pub concurrency: usize,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

impl EmbedOptions {
    /// Set the concurrency bound (clamped to at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Embed a batch of nodes.
///
/// Every node in the batch is embedded from its `Embed` content view,
/// with no deduplication or caching within a single call. Work is issued in
/// slices of `options.concurrency`; results are reassembled in input
/// order so downstream index mutation is reproducible.
pub fn embed_nodes(
    provider: &dyn EmbeddingProvider,
    nodes: &[Node],
    options: &EmbedOptions,
    observer: &dyn ProgressObserver,
) -> SiftResult<Vec<NodeWithEmbedding>> {
    let total = nodes.len();
    debug!(
        "Embedding {} nodes (concurrency {})",
        total, options.concurrency
    );

    let mut out = Vec::with_capacity(total);
    for chunk in nodes.chunks(options.concurrency.max(1)) {
        let embeddings: Vec<Vec<f32>> = chunk
            .par_iter()
            .map(|node| {
                provider
                    .embed(&node.content(ContentMode::Embed))
                    .map_err(|e| SiftError::embedding(format!("node `{}`: {}", node.id, e)))
            })
            .collect::<SiftResult<_>>()?;

        for (node, embedding) in chunk.iter().zip(embeddings) {
            out.push(NodeWithEmbedding {
                node: node.clone(),
                embedding,
            });
        }
        observer.on_progress(out.len(), total);
    }

    Ok(out)
}

// ============================================================================
// HashEmbeddingProvider
// ============================================================================

/// Deterministic embedding provider seeded from a content hash.
///
/// Produces normalized vectors that are stable across runs, so equal texts
/// always land on identical embeddings. Meant for tests and examples; it
/// carries no semantic signal.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimension: usize,
}

impl HashEmbeddingProvider {
    /// Create a provider producing vectors of `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl EmbeddingProvider for HashEmbeddingProvider {
    fn dim(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 33) as f32 / (u32::MAX as f32 / 2.0)) - 1.0;
            embedding.push(value);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }

        Ok(embedding)
    }
}

// ============================================================================
// Tests
// ============================================================================
