//! Persisted cache index: per-entry metadata plus accounting counters.
//!
//! The index is the single source of truth for LRU order and TTL state.
//! It is rewritten atomically (temp + rename) on every mutation so a crash
//! leaves either the old or the new index, never a torn one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{CacheResult, write_atomic};

pub const INDEX_FILE: &str = "index.json";

/// Filesystem-safe storage key for an arbitrary caller-supplied cache key.
///
/// Caller keys are opaque strings (hashes, identifiers, URLs); hashing them
/// keeps the on-disk layout flat and collision-free regardless of content.
pub fn storage_key(cache_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cache_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Metadata for one cached payload.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryState {
    pub size_bytes: u64,
    pub created_ms: u64,
    pub last_access_ms: u64,
}

/// On-disk index document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CacheIndex {
    /// Storage key (hex) -> entry metadata.
    pub entries: HashMap<String, EntryState>,
    pub hit_count: u64,
    pub miss_count: u64,
}

impl CacheIndex {
    /// Load the index from `root_dir`, or start empty if none exists yet.
    pub fn load(root_dir: &Path) -> CacheResult<Self> {
        let path = root_dir.join(INDEX_FILE);
        if !path.exists() {
            return Ok(CacheIndex::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| {
            crate::CacheError::ReadFailed {
                path: path.clone(),
                source,
            }
        })?;
        let index: CacheIndex = serde_json::from_str(&content)?;
        Ok(index)
    }

    /// Atomically persist the index into `root_dir`.
    pub fn save(&self, root_dir: &Path) -> CacheResult<()> {
        let content = serde_json::to_vec_pretty(self)?;
        write_atomic(&root_dir.join(INDEX_FILE), &content)
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.values().map(|e| e.size_bytes).sum()
    }
}

/// Payload location for a storage key: `<root>/<aa>/<bb>/<hash>`.
///
/// Two-level sharding keeps directory fan-out bounded for large caches.
pub fn payload_path(root_dir: &Path, storage_key: &str) -> PathBuf {
    root_dir
        .join(&storage_key[0..2])
        .join(&storage_key[2..4])
        .join(storage_key)
}
