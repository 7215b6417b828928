//! Simple in-memory vector store with JSONL persistence.
//!
//! Linear-scan cosine similarity over an in-memory table. Intended for
//! tests and small indexes where a full vector database is not justified;
//! production deployments plug a real backend into [`VectorStore`].

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use super::traits::{EntryId, MetadataFilters, VectorHit, VectorRecord, VectorStore};
use crate::error::{StoreError, StoreResult};

/// A stored vector entry, one JSONL line when persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredVector {
    id: String,
    embedding: Vec<f32>,
    node_id: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

/// In-memory vector store using linear scan and cosine similarity.
#[derive(Debug, Default)]
pub struct SimpleVectorStore {
    /// Expected embedding dimension; `None` adopts the first insert's.
    dimension: RwLock<Option<usize>>,

    /// Stored vectors keyed by entry id, plus insertion order for stable
    /// tie-breaking.
    vectors: RwLock<HashMap<String, StoredVector>>,
    order: RwLock<Vec<String>>,
}

impl SimpleVectorStore {
    /// Create an empty store that adopts the first inserted dimension.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with a fixed embedding dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: RwLock::new(Some(dimension)),
            ..Self::default()
        }
    }

    /// Load a store from a previously persisted JSONL file.
    pub fn from_persist_path(path: &Path) -> StoreResult<Self> {
        debug!("Loading SimpleVectorStore from {:?}", path);

        if !path.exists() {
            return Err(StoreError::not_found(path));
        }

        let store = Self::new();
        let reader = BufReader::new(File::open(path)?);
        {
            let mut vectors = store.write(&store.vectors)?;
            let mut order = store.write(&store.order)?;
            for (line_num, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let stored: StoredVector = serde_json::from_str(&line).map_err(|e| {
                    StoreError::parse(path, format!("line {}: {}", line_num + 1, e))
                })?;
                if vectors.insert(stored.id.clone(), stored.clone()).is_none() {
                    order.push(stored.id);
                }
            }
        }
        let dim = {
            let order = store.read(&store.order)?;
            let vectors = store.read(&store.vectors)?;
            order
                .first()
                .and_then(|id| vectors.get(id))
                .map(|v| v.embedding.len())
        };
        if dim.is_some() {
            *store.write(&store.dimension)? = dim;
        }

        Ok(store)
    }

    fn read<'a, T>(&self, lock: &'a RwLock<T>) -> StoreResult<std::sync::RwLockReadGuard<'a, T>> {
        lock.read()
            .map_err(|e| StoreError::internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn write<'a, T>(&self, lock: &'a RwLock<T>) -> StoreResult<std::sync::RwLockWriteGuard<'a, T>> {
        lock.write()
            .map_err(|e| StoreError::internal(format!("Failed to acquire write lock: {}", e)))
    }
}

impl VectorStore for SimpleVectorStore {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn add(&self, records: &[VectorRecord]) -> StoreResult<Vec<EntryId>> {
        debug!("Adding {} vectors", records.len());

        let mut dimension = self.write(&self.dimension)?;
        let mut vectors = self.write(&self.vectors)?;
        let mut order = self.write(&self.order)?;

        let mut assigned = Vec::with_capacity(records.len());
        for record in records {
            let expected = *dimension.get_or_insert(record.embedding.len());
            if record.embedding.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: record.embedding.len(),
                });
            }

            let id = record
                .id
                .clone()
                .unwrap_or_else(|| EntryId::new(Uuid::new_v4().to_string()));
            let stored = StoredVector {
                id: id.as_str().to_string(),
                embedding: record.embedding.clone(),
                node_id: record.node_id.clone(),
                metadata: record.metadata.clone(),
            };
            if vectors.insert(stored.id.clone(), stored).is_none() {
                order.push(id.as_str().to_string());
            }
            assigned.push(id);
        }

        Ok(assigned)
    }

    fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        filters: Option<&MetadataFilters>,
    ) -> StoreResult<Vec<VectorHit>> {
        trace!("Querying SimpleVectorStore, top_k={}", top_k);

        let vectors = self.read(&self.vectors)?;
        let order = self.read(&self.order)?;

        // Score in insertion order so equal scores break ties stably.
        let mut scored: Vec<(f32, &str)> = order
            .iter()
            .filter_map(|id| vectors.get(id))
            .filter(|v| filters.map_or(true, |f| f.matches(&v.metadata)))
            .map(|v| (cosine_similarity(embedding, &v.embedding), v.id.as_str()))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let results: Vec<VectorHit> = scored
            .into_iter()
            .take(top_k)
            .map(|(score, id)| VectorHit::new(id, score))
            .collect();

        trace!("Found {} results", results.len());
        Ok(results)
    }

    fn delete(&self, ids: &[EntryId]) -> StoreResult<()> {
        debug!("Deleting {} vectors", ids.len());

        let mut vectors = self.write(&self.vectors)?;
        let mut order = self.write(&self.order)?;
        for id in ids {
            if vectors.remove(id.as_str()).is_some() {
                order.retain(|o| o.as_str() != id.as_str());
            }
        }
        Ok(())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.read(&self.vectors)?.len())
    }

    fn persist(&self, path: &Path) -> StoreResult<()> {
        debug!("Persisting SimpleVectorStore to {:?}", path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let vectors = self.read(&self.vectors)?;
        let order = self.read(&self.order)?;

        let mut file = File::create(path)?;
        for id in order.iter() {
            if let Some(stored) = vectors.get(id) {
                writeln!(file, "{}", serde_json::to_string(stored)?)?;
            }
        }
        Ok(())
    }
}

/// Cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

// ============================================================================
// Tests
// ============================================================================
