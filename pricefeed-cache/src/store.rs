use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pricefeed_types::CacheStats;

use crate::clock::{Clock, SystemClock};
use crate::flight::{Flight, SingleFlight};
use crate::pattern::glob_match;
use crate::sweep::SweepHandle;
use crate::lock;

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        if by > 0 {
            counter.fetch_add(by, Ordering::Relaxed);
        }
    }

    fn reset(&self) {
        for c in [
            &self.hits,
            &self.misses,
            &self.sets,
            &self.deletes,
            &self.evictions,
        ] {
            c.store(0, Ordering::Relaxed);
        }
    }
}

/// Thread-safe key/value store with per-entry expiry and usage statistics.
///
/// Expired entries are never returned: reads treat them as misses and evict
/// them on the spot, and the optional background sweep removes the rest.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    counters: Counters,
    clock: Arc<dyn Clock>,
    flights: SingleFlight<V>,
    sweeper: Mutex<Option<SweepHandle>>,
}

impl<V> fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &lock(&self.entries).len())
            .field("clock", &self.clock)
            .field("sweeping", &lock(&self.sweeper).is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`TtlCache`].
#[derive(Debug, Default)]
pub struct TtlCacheBuilder {
    sweep_interval: Option<Duration>,
    clock: Option<Arc<dyn Clock>>,
}

impl TtlCacheBuilder {
    /// Run a background expiry sweep at this interval.
    ///
    /// The sweep is only started when [`build`](Self::build) runs inside a Tokio
    /// runtime. A zero interval disables it.
    #[must_use]
    pub fn sweep_interval(mut self, every: Duration) -> Self {
        self.sweep_interval = (!every.is_zero()).then_some(every);
        self
    }

    /// Use a custom time source.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the cache and start its sweep, if configured.
    #[must_use]
    pub fn build<V>(self) -> Arc<TtlCache<V>>
    where
        V: Clone + Send + Sync + 'static,
    {
        let cache = Arc::new(TtlCache {
            entries: Mutex::new(HashMap::new()),
            counters: Counters::default(),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            flights: SingleFlight::new(),
            sweeper: Mutex::new(None),
        });

        if let Some(every) = self.sweep_interval {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let weak = Arc::downgrade(&cache);
                    let handle = SweepHandle::spawn(&runtime, every, move || {
                        weak.upgrade().is_some_and(|c| {
                            c.sweep();
                            true
                        })
                    });
                    *lock(&cache.sweeper) = Some(handle);
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("no tokio runtime; background cache sweep disabled");
                }
            }
        }
        cache
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Start building a cache.
    #[must_use]
    pub fn builder() -> TtlCacheBuilder {
        TtlCacheBuilder::default()
    }

    /// Cache with the system clock and no background sweep.
    #[must_use]
    pub fn new() -> Arc<Self> {
        TtlCacheBuilder::default().build()
    }

    /// Fetch a live value. Counts a hit or a miss; a stale entry is evicted.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = lock(&self.entries);
        match entries.get(key) {
            Some(e) if e.is_fresh(now) => {
                Counters::bump(&self.counters.hits, 1);
                Some(e.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                Counters::bump(&self.counters.evictions, 1);
                Counters::bump(&self.counters.misses, 1);
                None
            }
            None => {
                Counters::bump(&self.counters.misses, 1);
                None
            }
        }
    }

    /// Read a live value without touching hit/miss counters.
    fn peek(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        lock(&self.entries)
            .get(key)
            .filter(|e| e.is_fresh(now))
            .map(|e| e.value.clone())
    }

    /// Store a value that stays live for `ttl`.
    ///
    /// A zero TTL is ignored: such an entry would already be expired.
    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        if ttl.is_zero() {
            #[cfg(feature = "tracing")]
            tracing::debug!(key, "ignoring cache set with zero ttl");
            return;
        }
        let created_at = self.clock.now();
        let entry = CacheEntry {
            value,
            created_at,
            expires_at: created_at + ttl,
        };
        lock(&self.entries).insert(key.to_string(), entry);
        Counters::bump(&self.counters.sets, 1);
    }

    /// Whether a live entry exists. Does not affect hit/miss counters.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut entries = lock(&self.entries);
        match entries.get(key) {
            Some(e) if e.is_fresh(now) => true,
            Some(_) => {
                entries.remove(key);
                Counters::bump(&self.counters.evictions, 1);
                false
            }
            None => false,
        }
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        lock(&self.entries)
            .get(key)
            .filter(|e| e.is_fresh(now))
            .map(|e| e.expires_at - now)
    }

    /// Age of a live entry.
    pub fn age(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        lock(&self.entries)
            .get(key)
            .filter(|e| e.is_fresh(now))
            .map(|e| now.saturating_duration_since(e.created_at))
    }

    /// Remove one entry. Returns whether anything was removed.
    pub fn delete(&self, key: &str) -> bool {
        let removed = lock(&self.entries).remove(key).is_some();
        if removed {
            Counters::bump(&self.counters.deletes, 1);
        }
        removed
    }

    /// Remove every entry whose key matches a wildcard pattern.
    ///
    /// Returns the number of entries removed.
    pub fn clear_pattern(&self, pattern: &str) -> usize {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|k, _| !glob_match(pattern, k));
        let removed = before - entries.len();
        drop(entries);
        Counters::bump(&self.counters.deletes, removed as u64);
        #[cfg(feature = "tracing")]
        tracing::debug!(pattern, removed, "cleared cache entries");
        removed
    }

    /// Remove everything.
    pub fn clear(&self) -> usize {
        self.clear_pattern("*")
    }

    /// Evict all expired entries. Returns the number evicted.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|_, e| e.is_fresh(now));
        let evicted = before - entries.len();
        drop(entries);
        Counters::bump(&self.counters.evictions, evicted as u64);
        #[cfg(feature = "tracing")]
        if evicted > 0 {
            tracing::debug!(evicted, "cache sweep evicted expired entries");
        }
        evicted
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the usage counters.
    pub fn stats(&self) -> CacheStats {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        CacheStats {
            hits,
            misses,
            sets: self.counters.sets.load(Ordering::Relaxed),
            deletes: self.counters.deletes.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            entries: self.len(),
            hit_rate: CacheStats::compute_hit_rate(hits, misses),
        }
    }

    /// Zero the usage counters. Stored entries are kept.
    pub fn reset_stats(&self) {
        self.counters.reset();
    }

    /// Claim single-flight leadership over `key`.
    ///
    /// Batch callers use this to coalesce with concurrent fetches of the same
    /// key; a leader must [`complete`](crate::FlightLeader::complete) or drop
    /// its claim.
    pub fn claim(&self, key: &str) -> Flight<V> {
        self.flights.claim(key)
    }

    /// Number of keys with a fetch in progress.
    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }

    /// Return the cached value for `key`, or run `producer`, store its value
    /// for `ttl` and return it.
    ///
    /// Concurrent callers for the same key share one producer run. Errors are
    /// returned to the caller and never cached; followers of a failed leader
    /// run their own producer.
    ///
    /// # Errors
    /// Propagates the producer's error.
    pub async fn wrap<E, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(v) = self.get(key) {
            return Ok(v);
        }

        match self.claim(key) {
            Flight::Leader(leader) => {
                // A previous leader may have filled the entry between our miss and the claim.
                if let Some(v) = self.peek(key) {
                    leader.complete(v.clone());
                    return Ok(v);
                }
                let value = producer().await?;
                self.set(key, value.clone(), ttl);
                leader.complete(value.clone());
                Ok(value)
            }
            Flight::Follower(follower) => {
                if let Some(v) = follower.wait().await {
                    return Ok(v);
                }
                #[cfg(feature = "tracing")]
                tracing::debug!(key, "single-flight leader failed; fetching independently");
                let value = producer().await?;
                self.set(key, value.clone(), ttl);
                Ok(value)
            }
        }
    }

    /// Whether a background sweep is running.
    pub fn is_sweeping(&self) -> bool {
        lock(&self.sweeper).as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the background sweep, waiting for it to exit.
    pub async fn shutdown(&self) {
        let handle = lock(&self.sweeper).take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;

    fn manual() -> (Arc<ManualClock>, Arc<TtlCache<u32>>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::<u32>::builder().clock(clock.clone()).build();
        (clock, cache)
    }

    #[test]
    fn expired_get_is_a_miss_and_evicts() {
        let (clock, cache) = manual();
        cache.set("k1", 42, Duration::from_millis(1000));
        assert_eq!(cache.get("k1"), Some(42));
        clock.advance(Duration::from_millis(1100));
        assert_eq!(cache.get("k1"), None);

        let s = cache.stats();
        assert_eq!((s.hits, s.misses, s.sets), (1, 1, 1));
        assert_eq!(s.evictions, 1);
        assert_eq!(s.entries, 0);
        assert!((s.hit_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn entry_expires_exactly_at_deadline() {
        let (clock, cache) = manual();
        cache.set("k", 1, Duration::from_millis(100));
        clock.advance(Duration::from_millis(99));
        assert!(cache.has("k"));
        assert_eq!(cache.ttl_remaining("k"), Some(Duration::from_millis(1)));
        clock.advance(Duration::from_millis(1));
        assert!(!cache.has("k"));
    }

    #[test]
    fn has_does_not_touch_hit_counters() {
        let (_, cache) = manual();
        cache.set("k", 1, Duration::from_secs(1));
        assert!(cache.has("k"));
        assert!(!cache.has("missing"));
        let s = cache.stats();
        assert_eq!((s.hits, s.misses), (0, 0));
    }

    #[test]
    fn delete_counts_only_actual_removals() {
        let (_, cache) = manual();
        cache.set("k", 1, Duration::from_secs(1));
        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));
        assert_eq!(cache.stats().deletes, 1);
    }

    #[test]
    fn overwrite_resets_expiry() {
        let (clock, cache) = manual();
        cache.set("k", 1, Duration::from_millis(100));
        clock.advance(Duration::from_millis(80));
        cache.set("k", 2, Duration::from_millis(100));
        clock.advance(Duration::from_millis(80));
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.age("k"), Some(Duration::from_millis(80)));
    }

    #[test]
    fn zero_ttl_is_ignored() {
        let (_, cache) = manual();
        cache.set("k", 1, Duration::ZERO);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().sets, 0);
    }

    #[test]
    fn sweep_removes_only_expired() {
        let (clock, cache) = manual();
        cache.set("short", 1, Duration::from_millis(10));
        cache.set("long", 2, Duration::from_secs(10));
        clock.advance(Duration::from_millis(20));
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.has("long"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn reset_stats_keeps_entries() {
        let (_, cache) = manual();
        cache.set("k", 1, Duration::from_secs(1));
        let _ = cache.get("k");
        let _ = cache.get("x");
        cache.reset_stats();
        let s = cache.stats();
        assert_eq!((s.hits, s.misses, s.sets), (0, 0, 0));
        assert_eq!(s.entries, 1);
        assert!(s.hit_rate.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn wrap_does_not_cache_errors() {
        let (_, cache) = manual();
        let r: Result<u32, &str> = cache
            .wrap("k", Duration::from_secs(1), || async { Err("boom") })
            .await;
        assert_eq!(r, Err("boom"));
        assert!(!cache.has("k"));
        assert_eq!(cache.in_flight(), 0);

        let r: Result<u32, &str> = cache
            .wrap("k", Duration::from_secs(1), || async { Ok(5) })
            .await;
        assert_eq!(r, Ok(5));
        let r: Result<u32, &str> = cache
            .wrap("k", Duration::from_secs(1), || async { Ok(6) })
            .await;
        assert_eq!(r, Ok(5));
    }
}
