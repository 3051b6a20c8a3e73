//! Configuration types shared across the façade, the orchestrator and the cache.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::asset::{AssetClass, DataCategory};
use crate::error::PricefeedError;

/// TTL table and sweep cadence for the market-data cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for live price quotes.
    pub quote_ttl_ms: u64,
    /// TTL for detailed market snapshots.
    pub snapshot_ttl_ms: u64,
    /// TTL for symbol directories / listings.
    pub directory_ttl_ms: u64,
    /// TTL for historical series.
    pub historical_ttl_ms: u64,
    /// Interval of the background expiry sweep; `0` disables it.
    pub sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            quote_ttl_ms: 30_000,
            snapshot_ttl_ms: 60_000,
            directory_ttl_ms: 24 * 60 * 60 * 1000,
            historical_ttl_ms: 60 * 60 * 1000,
            sweep_interval_ms: 60_000,
        }
    }
}

impl CacheConfig {
    /// TTL configured for a data category.
    #[must_use]
    pub const fn ttl_for(&self, category: DataCategory) -> Duration {
        let ms = match category {
            DataCategory::Quote => self.quote_ttl_ms,
            DataCategory::Snapshot => self.snapshot_ttl_ms,
            DataCategory::Directory => self.directory_ttl_ms,
            DataCategory::Historical => self.historical_ttl_ms,
        };
        Duration::from_millis(ms)
    }

    /// Sweep interval, or `None` when the sweep is disabled.
    #[must_use]
    pub const fn sweep_interval(&self) -> Option<Duration> {
        if self.sweep_interval_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.sweep_interval_ms))
        }
    }

    /// Validate the table.
    ///
    /// # Errors
    /// Returns `Config` if any TTL is zero.
    pub fn validate(&self) -> Result<(), PricefeedError> {
        for (name, ms) in [
            ("quote_ttl_ms", self.quote_ttl_ms),
            ("snapshot_ttl_ms", self.snapshot_ttl_ms),
            ("directory_ttl_ms", self.directory_ttl_ms),
            ("historical_ttl_ms", self.historical_ttl_ms),
        ] {
            if ms == 0 {
                return Err(PricefeedError::config(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

/// Process-wide configuration for the price façade, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricefeedConfig {
    /// Cache TTL table and sweep cadence.
    pub cache: CacheConfig,
    /// Timeout for individual provider calls.
    pub provider_timeout: Duration,
    /// Maximum number of provider chunks executing at once.
    pub max_in_flight: usize,
    /// Provider names per asset class, tried in order.
    ///
    /// Classes without an entry use every registered provider that supports the
    /// class, in registration order.
    pub chains: BTreeMap<AssetClass, Vec<String>>,
    /// Chunk size overrides keyed by provider name.
    pub chunk_sizes: BTreeMap<String, usize>,
}

impl Default for PricefeedConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            provider_timeout: Duration::from_secs(10),
            max_in_flight: 4,
            chains: BTreeMap::new(),
            chunk_sizes: BTreeMap::new(),
        }
    }
}

impl PricefeedConfig {
    /// Parse a configuration document. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `Config` if the document is not valid JSON for this schema or
    /// fails validation.
    pub fn from_json_str(s: &str) -> Result<Self, PricefeedError> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| PricefeedError::config(format!("invalid configuration: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate bounds that would otherwise surface mid-request.
    ///
    /// # Errors
    /// Returns `Config` on a zero concurrency bound, a zero chunk size, a zero
    /// timeout or an invalid TTL table.
    pub fn validate(&self) -> Result<(), PricefeedError> {
        self.cache.validate()?;
        if self.max_in_flight == 0 {
            return Err(PricefeedError::config("max_in_flight must be positive"));
        }
        if self.provider_timeout.is_zero() {
            return Err(PricefeedError::config("provider_timeout must be positive"));
        }
        if let Some((name, _)) = self.chunk_sizes.iter().find(|(_, n)| **n == 0) {
            return Err(PricefeedError::config(format!(
                "chunk size for {name} must be positive"
            )));
        }
        Ok(())
    }
}
