//! Report envelopes produced by the batch orchestrator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PricefeedError;
use crate::record::PriceRecord;

/// Result of a multi-symbol price request.
///
/// A non-empty `failed_symbols` is still a successful call: callers render
/// "price unavailable" for those entries and live data for everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BatchOutcome {
    /// Successful records in input symbol order.
    pub records: Vec<PriceRecord>,
    /// Number of symbols answered from the cache.
    pub cached_count: usize,
    /// Number of symbols answered by a provider during this call.
    pub fetched_count: usize,
    /// Symbols that every attempted provider failed for, in input order.
    pub failed_symbols: Vec<String>,
    /// Last failure observed per failed symbol.
    pub failures: BTreeMap<String, PricefeedError>,
    /// `cached_count / requested` as a percentage for this call.
    pub cache_hit_rate: f64,
}

impl BatchOutcome {
    /// Number of distinct symbols the call covered.
    #[must_use]
    pub fn requested(&self) -> usize {
        self.cached_count + self.fetched_count + self.failed_symbols.len()
    }

    /// Returns true if every requested symbol produced a record.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_symbols.is_empty()
    }

    /// Look up a record by canonical symbol.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&PriceRecord> {
        self.records.iter().find(|r| r.symbol() == symbol)
    }

    /// Compute a hit rate percentage; an empty request counts as fully cached.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(cached: usize, requested: usize) -> f64 {
        if requested == 0 {
            100.0
        } else {
            cached as f64 / requested as f64 * 100.0
        }
    }
}
