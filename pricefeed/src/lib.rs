//! Pricefeed answers price lookups across several unreliable market data providers.
//!
//! Overview
//! - Every lookup goes through one in-memory TTL cache first. Quotes live 30s,
//!   snapshots 60s, historical series 60min and class directories 24h by default.
//! - On a miss, the ordered provider chain for the asset class is walked until one
//!   provider answers. Each provider call is bounded by a timeout and by a
//!   process-wide in-flight limit.
//! - Multi-symbol requests go through a batch orchestrator that only sends
//!   uncached symbols upstream, groups them into provider-sized chunks and reports
//!   per-symbol failures as data instead of failing the whole request.
//! - Concurrent misses on the same key share one upstream fetch.
//!
//! Key behaviors and trade-offs
//! - A fully cached batch never reaches provider code.
//! - Errors are never cached, so a failing symbol is retried on the next request.
//! - Without an asset-class hint the known-symbol registry guesses a class and the
//!   remaining classes are tried in a fixed order; this costs extra provider calls
//!   for symbols nobody can price.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use pricefeed::{AssetClass, Pricefeed};
//! use pricefeed_providers::{CoinGeckoProvider, FinnhubProvider, YahooProvider};
//!
//! let feed = Pricefeed::builder()
//!     .with_provider(Arc::new(CoinGeckoProvider::new()))
//!     .with_provider(Arc::new(FinnhubProvider::from_env()?))
//!     .with_provider(Arc::new(YahooProvider::new()))
//!     .chain_for(AssetClass::Crypto, &[CoinGeckoProvider::KEY, YahooProvider::KEY])
//!     .chain_for(AssetClass::Equity, &[FinnhubProvider::KEY, YahooProvider::KEY])
//!     .build()?;
//!
//! let outcome = feed.fetch_many(&["BTC", "ETH", "AAPL"], None).await?;
//! for symbol in &outcome.failed_symbols {
//!     println!("price unavailable for {symbol}");
//! }
//! feed.invalidate(Some("BTC"))?;
//! println!("{:?}", feed.stats());
//! ```
//!
//! See `pricefeed/examples/` for runnable demonstrations.
#![warn(missing_docs)]

pub(crate) mod core;
mod router;

pub use crate::core::{Pricefeed, PricefeedBuilder, tag_err};
pub use router::util::collapse_errors;

pub use pricefeed_cache::{Clock, ManualClock, SystemClock, TtlCache};

// Re-export core types for convenience
pub use pricefeed_core::{
    AssetClass, AuxValue, BatchOutcome, CacheConfig, CacheStats, DataCategory, HistoryPeriod,
    ListingEntry, MarketValue, PriceProvider, PricePoint, PriceRecord, PricefeedConfig,
    PricefeedError, ProviderKey, SymbolRegistry, keys, normalize_symbol, normalize_symbols,
};
