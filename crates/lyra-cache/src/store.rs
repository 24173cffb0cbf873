//! `DiskCache`: the keyed byte-blob store.
//!
//! All operations run under a single mutex per cache instance, and the
//! statistics counters are updated inside the same critical section as the
//! operation they describe, so concurrent readers never undercount and a
//! `get` never observes a half-written entry.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::index::{CacheIndex, EntryState, payload_path, storage_key};
use crate::{
    CacheError, CacheOptions, CacheResult, CacheStatistics, EvictionPolicy, LruPolicy, SweepStats,
    write_atomic,
};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Thread-safe disk cache with LRU + TTL eviction.
///
/// Callers receive owned copies of payload bytes, never references into
/// cache-internal storage.
#[derive(Debug)]
pub struct DiskCache {
    root_dir: PathBuf,
    options: CacheOptions,
    index: Mutex<CacheIndex>,
}

impl DiskCache {
    /// Open (or create) a cache rooted at `options.root_dir`.
    ///
    /// An existing index is reloaded, so LRU order, TTL state, and
    /// statistics survive a restart.
    pub fn open(options: CacheOptions) -> CacheResult<Self> {
        let root_dir = options
            .root_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("lyra-cache"));

        std::fs::create_dir_all(&root_dir).map_err(|source| CacheError::DirectoryUnavailable {
            path: root_dir.clone(),
            source,
        })?;

        let index = CacheIndex::load(&root_dir)?;
        debug!(
            root = %root_dir.display(),
            entries = index.entries.len(),
            "opened disk cache"
        );

        Ok(DiskCache {
            root_dir,
            options,
            index: Mutex::new(index),
        })
    }

    /// Look up a payload. `Ok(None)` is a miss, which also covers entries
    /// that turned out to be expired; I/O failures on an existing payload
    /// are errors, not misses.
    pub fn get(&self, cache_key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut index = self.index.lock();
        let skey = storage_key(cache_key);
        let now = now_ms();

        let Some(state) = index.entries.get(&skey).cloned() else {
            index.miss_count += 1;
            index.save(&self.root_dir)?;
            debug!(key = cache_key, "cache miss");
            return Ok(None);
        };

        if self.is_expired(&state, now) {
            let _ = std::fs::remove_file(payload_path(&self.root_dir, &skey));
            index.entries.remove(&skey);
            index.miss_count += 1;
            index.save(&self.root_dir)?;
            debug!(key = cache_key, "cache entry expired");
            return Ok(None);
        }

        let path = payload_path(&self.root_dir, &skey);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                // Index said present but the payload is gone (crash window):
                // heal the index and report a miss.
                index.entries.remove(&skey);
                index.miss_count += 1;
                index.save(&self.root_dir)?;
                warn!(key = cache_key, "payload missing for indexed entry");
                return Ok(None);
            }
            Err(source) => return Err(CacheError::ReadFailed { path, source }),
        };

        if let Some(state) = index.entries.get_mut(&skey) {
            state.last_access_ms = now;
        }
        index.hit_count += 1;
        index.save(&self.root_dir)?;
        trace!(key = cache_key, len = bytes.len(), "cache hit");
        Ok(Some(bytes))
    }

    /// Write or overwrite an entry, then enforce the capacity bounds.
    ///
    /// The payload is written atomically, so a failed put leaves any
    /// pre-existing entry for the key untouched.
    pub fn put(&self, cache_key: &str, bytes: &[u8]) -> CacheResult<()> {
        let mut index = self.index.lock();
        let skey = storage_key(cache_key);
        let path = payload_path(&self.root_dir, &skey);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::WriteFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        write_atomic(&path, bytes)?;

        let now = now_ms();
        index.entries.insert(
            skey,
            EntryState {
                size_bytes: bytes.len() as u64,
                created_ms: now,
                last_access_ms: now,
            },
        );

        self.enforce_capacity(&mut index);
        index.save(&self.root_dir)?;
        debug!(key = cache_key, len = bytes.len(), "cached payload");
        Ok(())
    }

    /// True iff an entry exists and its TTL has not elapsed. Non-mutating.
    pub fn is_valid(&self, cache_key: &str) -> bool {
        let index = self.index.lock();
        let skey = storage_key(cache_key);
        match index.entries.get(&skey) {
            Some(state) => !self.is_expired(state, now_ms()),
            None => false,
        }
    }

    /// Remove every entry whose TTL has elapsed.
    ///
    /// Removal is independent per entry: an un-removable payload is counted
    /// in `failed`, left in the index for a later retry, and the sweep
    /// continues.
    pub fn invalidate_expired(&self) -> CacheResult<SweepStats> {
        let mut index = self.index.lock();
        let now = now_ms();
        let mut stats = SweepStats::default();

        let expired: Vec<String> = index
            .entries
            .iter()
            .filter(|(_, state)| self.is_expired(state, now))
            .map(|(key, _)| key.clone())
            .collect();

        for skey in expired {
            let path = payload_path(&self.root_dir, &skey);
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    index.entries.remove(&skey);
                    stats.removed += 1;
                }
                Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                    index.entries.remove(&skey);
                    stats.removed += 1;
                }
                Err(source) => {
                    stats.failed += 1;
                    warn!(path = %path.display(), error = %source, "failed to remove expired entry");
                }
            }
        }

        index.save(&self.root_dir)?;
        debug!(removed = stats.removed, failed = stats.failed, "TTL sweep");
        Ok(stats)
    }

    /// Remove all entries and reset the statistics counters.
    pub fn clear(&self) -> CacheResult<()> {
        let mut index = self.index.lock();

        match std::fs::remove_dir_all(&self.root_dir) {
            Ok(()) => {}
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(CacheError::WriteFailed {
                    path: self.root_dir.clone(),
                    source,
                });
            }
        }
        std::fs::create_dir_all(&self.root_dir).map_err(|source| {
            CacheError::DirectoryUnavailable {
                path: self.root_dir.clone(),
                source,
            }
        })?;

        *index = CacheIndex::default();
        index.save(&self.root_dir)?;
        debug!(root = %self.root_dir.display(), "cache cleared");
        Ok(())
    }

    /// Explicitly enforce the capacity bounds (normally done after every
    /// put). Useful after shrinking the limits of a reopened cache.
    pub fn evict_to_capacity(&self) -> CacheResult<()> {
        let mut index = self.index.lock();
        self.enforce_capacity(&mut index);
        index.save(&self.root_dir)
    }

    /// Snapshot of usage and accounting counters. Non-mutating.
    pub fn statistics(&self) -> CacheStatistics {
        let index = self.index.lock();
        CacheStatistics {
            entry_count: index.entries.len(),
            total_bytes: index.total_bytes(),
            hit_count: index.hit_count,
            miss_count: index.miss_count,
        }
    }

    fn is_expired(&self, state: &EntryState, now: u64) -> bool {
        let ttl_ms = self.options.ttl.as_millis() as u64;
        now.saturating_sub(state.created_ms) >= ttl_ms
    }

    /// Evict least-recently-used entries until both capacity bounds hold.
    /// TTL expiry is handled separately; capacity only looks at LRU order.
    fn enforce_capacity(&self, index: &mut CacheIndex) {
        let mut total = index.total_bytes();
        if index.entries.len() <= self.options.max_entries
            && total <= self.options.max_total_bytes
        {
            return;
        }

        let mut candidates: Vec<(String, EntryState)> = index
            .entries
            .iter()
            .map(|(key, state)| (key.clone(), state.clone()))
            .collect();
        LruPolicy.sort_by_priority(&mut candidates);

        for (victim, state) in candidates {
            if index.entries.len() <= self.options.max_entries
                && total <= self.options.max_total_bytes
            {
                break;
            }
            let _ = std::fs::remove_file(payload_path(&self.root_dir, &victim));
            index.entries.remove(&victim);
            total -= state.size_bytes;
            debug!(size = state.size_bytes, "evicted LRU entry");
        }
    }
}
