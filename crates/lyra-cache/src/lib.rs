#![forbid(unsafe_code)]

//! Disk cache for keyed byte blobs with LRU eviction, TTL expiration,
//! and hit/miss accounting.
//!
//! The cache owns its backing directory exclusively: payloads are stored as
//! sharded files, entry metadata and statistics live in an atomically
//! rewritten `index.json`, so LRU order, TTL state, and counters survive a
//! process restart.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

mod atomic_write;
mod evict;
mod index;
mod store;

pub use atomic_write::write_atomic;
pub use evict::{EvictionPolicy, LruPolicy};
pub use index::{CacheIndex, EntryState, storage_key};
pub use store::DiskCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache directory unavailable: {path}: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache write failed: {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache read failed: {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache index error: {0}")]
    Index(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Default capacity and expiry limits.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 20 * 1024 * 1024;
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Debug)]
pub struct CacheOptions {
    /// Backing directory. Defaults to `<tmp>/lyra-cache` so the persisted
    /// index is found again across restarts.
    pub root_dir: Option<PathBuf>,
    /// Maximum number of entries before LRU eviction kicks in.
    pub max_entries: usize,
    /// Maximum total payload bytes before LRU eviction kicks in.
    pub max_total_bytes: u64,
    /// Age after which an entry is stale regardless of access pattern.
    pub ttl: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            root_dir: None,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            ttl: DEFAULT_TTL,
        }
    }
}

impl CacheOptions {
    /// Set the backing directory.
    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(root_dir.into());
        self
    }

    /// Set the entry-count bound.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set the total-size bound in bytes.
    pub fn with_max_total_bytes(mut self, max_total_bytes: u64) -> Self {
        self.max_total_bytes = max_total_bytes;
        self
    }

    /// Set the entry time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Snapshot of cache usage and accounting counters.
///
/// Counters are monotonically non-decreasing within a session except across
/// an explicit [`DiskCache::clear`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    pub entry_count: usize,
    pub total_bytes: u64,
    pub hit_count: u64,
    pub miss_count: u64,
}

impl CacheStatistics {
    /// Fraction of accesses that were hits; 0.0 before any access.
    pub fn hit_rate(&self) -> f64 {
        let accesses = self.hit_count + self.miss_count;
        if accesses == 0 {
            return 0.0;
        }
        self.hit_count as f64 / accesses as f64
    }
}

/// Outcome of a TTL sweep. Removal is best-effort per entry; one
/// un-removable file never aborts the sweep for the rest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub removed: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_is_zero_before_any_access() {
        let stats = CacheStatistics::default();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_is_hits_over_accesses() {
        let stats = CacheStatistics {
            entry_count: 1,
            total_bytes: 10,
            hit_count: 3,
            miss_count: 1,
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn options_builders_override_defaults() {
        let opts = CacheOptions::default()
            .with_root_dir("/tmp/x")
            .with_max_entries(5)
            .with_max_total_bytes(1024)
            .with_ttl(Duration::from_secs(1));

        assert_eq!(opts.root_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(opts.max_entries, 5);
        assert_eq!(opts.max_total_bytes, 1024);
        assert_eq!(opts.ttl, Duration::from_secs(1));
    }

    #[test]
    fn default_limits_match_documented_values() {
        let opts = CacheOptions::default();
        assert_eq!(opts.max_entries, 1000);
        assert_eq!(opts.max_total_bytes, 20 * 1024 * 1024);
        assert_eq!(opts.ttl, Duration::from_secs(3600));
    }
}
