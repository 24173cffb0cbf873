//! Eviction policy for cache entries.

use crate::EntryState;

/// Determines which entries to evict when capacity is exceeded.
pub trait EvictionPolicy {
    /// Sort entries by eviction priority (first = most evictable).
    fn sort_by_priority(&self, entries: &mut Vec<(String, EntryState)>);
}

/// Least-recently-used policy: oldest `last_access_ms` first, ties broken
/// by oldest `created_ms`.
pub struct LruPolicy;

impl EvictionPolicy for LruPolicy {
    fn sort_by_priority(&self, entries: &mut Vec<(String, EntryState)>) {
        entries.sort_by_key(|(_, state)| (state.last_access_ms, state.created_ms));
    }
}
