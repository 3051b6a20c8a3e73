use serde::{Deserialize, Serialize};

/// Snapshot of cache counters.
///
/// Counters are owned by the cache store; callers only ever see copies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Successful fresh lookups.
    pub hits: u64,
    /// Lookups that found nothing or an expired entry.
    pub misses: u64,
    /// Writes (including overwrites).
    pub sets: u64,
    /// Explicit removals that actually removed an entry.
    pub deletes: u64,
    /// Expired entries removed lazily on read or by the sweep.
    pub evictions: u64,
    /// Entries currently stored (fresh or not yet swept).
    pub entries: usize,
    /// `hits / (hits + misses)` as a percentage; 0 when nothing was looked up.
    pub hit_rate: f64,
}

impl CacheStats {
    /// Derive the hit rate percentage from raw counters.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute_hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64 * 100.0
        }
    }
}
