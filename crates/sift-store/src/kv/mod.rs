//! Key-value store module for sift-store.
//!
//! ## Available Backends
//!
//! - [`SimpleKvStore`]: in-memory store persisted as a single JSON document;
//!   the only bundled backend implementing [`SnapshotStore`].
//!
//! Third-party backends implement [`KvStore`]; they override
//! `to_snapshot` when they can serialize their full state and additionally
//! implement [`SnapshotStore`] when they can be rebuilt from one.

mod simple;
mod traits;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{StoreError, StoreResult};

pub use simple::SimpleKvStore;
pub use traits::{KvStore, Snapshot, SnapshotStore};

/// Write a snapshot to a single JSON document at `path`.
///
/// Overwrites any existing file and creates parent directories as needed.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> StoreResult<()> {
    debug!("Writing snapshot to {:?}", path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, content)?;

    Ok(())
}

/// Read a snapshot from a JSON document at `path`.
///
/// Fails with [`StoreError::NotFound`] if the file does not exist and with
/// [`StoreError::Parse`] if it is not well-formed.
pub fn read_snapshot(path: &Path) -> StoreResult<Snapshot> {
    debug!("Reading snapshot from {:?}", path);

    if !path.exists() {
        return Err(StoreError::not_found(path));
    }

    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| StoreError::parse(path, e.to_string()))
}

/// Default filename for a persisted document store.
pub const DOCSTORE_FILENAME: &str = "docstore.json";

/// Where persisted stores land when the caller does not choose a path.
///
/// This is an explicit configuration value handed to stores at
/// construction, never process-global state. The platform data directory
/// is only the convenience default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistConfig {
    /// Directory that holds persisted store files.
    pub dir: PathBuf,
}

impl PersistConfig {
    /// Create a config rooted at an explicit directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform-appropriate default: `<data-local-dir>/sift`, falling back
    /// to the system temp directory when no data directory exists.
    pub fn default_dir() -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(base.join("sift"))
    }

    /// Path of the document store file inside this directory.
    pub fn docstore_path(&self) -> PathBuf {
        self.dir.join(DOCSTORE_FILENAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_config_paths() {
        let config = PersistConfig::new("/tmp/sift-test");
        assert_eq!(
            config.docstore_path(),
            PathBuf::from("/tmp/sift-test/docstore.json")
        );
    }

    #[test]
    fn test_default_dir_ends_with_sift() {
        let config = PersistConfig::default_dir();
        assert!(config.dir.ends_with("sift"));
    }
}
