//! Index bookkeeping structure.
//!
//! [`IndexRegistry`] is the bidirectional mapping between vector-backend
//! entry ids and node ids. The invariant it guards: every node id present
//! in the vector backend has exactly one registry entry and vice versa,
//! so there are no orphaned vectors and no dangling entries. Only the
//! index builder (and the delete path) mutate it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use sift_store::{EntryId, StoreError};

use crate::errors::SiftResult;

/// Bidirectional entry-id ↔ node-id map for one index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRegistry {
    /// Identifier of the index this registry belongs to.
    index_id: String,

    /// When the registry was created.
    created_at: DateTime<Utc>,

    /// Entry id → node id.
    entry_to_node: BTreeMap<String, String>,

    /// Node id → entry id.
    node_to_entry: BTreeMap<String, String>,
}

impl IndexRegistry {
    /// Create an empty registry with a fresh index id.
    pub fn new() -> Self {
        Self {
            index_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            entry_to_node: BTreeMap::new(),
            node_to_entry: BTreeMap::new(),
        }
    }

    /// Identifier of the index this registry belongs to.
    pub fn index_id(&self) -> &str {
        &self.index_id
    }

    /// When the registry was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Register a pairing, keeping the map one-to-one: any previous
    /// pairing involving either side is dropped first.
    pub fn insert(&mut self, entry_id: &EntryId, node_id: &str) {
        if let Some(prev_node) = self
            .entry_to_node
            .insert(entry_id.as_str().to_string(), node_id.to_string())
        {
            if prev_node != node_id {
                self.node_to_entry.remove(&prev_node);
            }
        }
        if let Some(prev_entry) = self
            .node_to_entry
            .insert(node_id.to_string(), entry_id.as_str().to_string())
        {
            if prev_entry != entry_id.as_str() {
                self.entry_to_node.remove(&prev_entry);
            }
        }
    }

    /// Resolve an entry id to its node id.
    pub fn node_id_for(&self, entry_id: &EntryId) -> Option<&str> {
        self.entry_to_node.get(entry_id.as_str()).map(String::as_str)
    }

    /// Resolve a node id to its entry id.
    pub fn entry_id_for(&self, node_id: &str) -> Option<EntryId> {
        self.node_to_entry
            .get(node_id)
            .map(|s| EntryId::new(s.as_str()))
    }

    /// Remove a pairing by entry id; returns whether it existed.
    pub fn remove_entry(&mut self, entry_id: &EntryId) -> bool {
        match self.entry_to_node.remove(entry_id.as_str()) {
            Some(node_id) => {
                self.node_to_entry.remove(&node_id);
                true
            }
            None => false,
        }
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entry_to_node.len()
    }

    /// Whether the registry holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entry_to_node.is_empty()
    }

    /// All registered node ids, in sorted order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.node_to_entry.keys().map(String::as_str)
    }

    /// Serialize the registry to a JSON document at `path`.
    pub fn persist(&self, path: &Path) -> SiftResult<()> {
        debug!("Persisting IndexRegistry {} to {:?}", self.index_id, path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load a registry from a previously persisted JSON document.
    pub fn from_persist_path(path: &Path) -> SiftResult<Self> {
        debug!("Loading IndexRegistry from {:?}", path);

        if !path.exists() {
            return Err(StoreError::not_found(path).into());
        }
        let content = fs::read_to_string(path)?;
        let registry =
            serde_json::from_str(&content).map_err(|e| StoreError::parse(path, e.to_string()))?;
        Ok(registry)
    }
}

impl Default for IndexRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
