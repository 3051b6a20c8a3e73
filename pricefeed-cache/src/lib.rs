//! pricefeed-cache
//!
//! Generic, thread-safe key/value store with per-entry expiry.
//!
//! - `store`: [`TtlCache`] with hit/miss statistics, wildcard invalidation and
//!   the `wrap` memoization helper.
//! - `clock`: injectable time source so expiry can be tested without sleeping.
//! - `flight`: in-flight request registry used to coalesce concurrent misses.
//! - `sweep`: cancellable background task that evicts expired entries.
//!
//! The background sweep requires a Tokio 1.x runtime; a cache built outside a
//! runtime still works but only evicts lazily (on read) or via [`TtlCache::sweep`].
#![warn(missing_docs)]

mod clock;
mod flight;
mod pattern;
mod store;
mod sweep;

pub use clock::{Clock, ManualClock, SystemClock};
pub use flight::{Flight, FlightFollower, FlightLeader, SingleFlight};
pub use pattern::glob_match;
pub use pricefeed_types::CacheStats;
pub use store::{TtlCache, TtlCacheBuilder};
pub use sweep::SweepHandle;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// Every critical section in this crate leaves the protected map consistent,
/// so a poisoned lock carries no broken invariant.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
