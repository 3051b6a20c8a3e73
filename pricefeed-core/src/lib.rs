//! pricefeed-core
//!
//! Contracts and pure helpers shared by the façade, the providers and the mocks.
//!
//! - `provider`: the `PriceProvider` trait every upstream adapter implements.
//! - `keys`: the colon-delimited cache key scheme and invalidation patterns.
//! - `symbol`: symbol normalization and de-duplication.
//! - `registry`: known-symbol heuristics used to guess an asset class.
//! - `value`: `MarketValue`, the single value type stored in the market cache.
#![warn(missing_docs)]

/// Cache key construction for every data category.
pub mod keys;
/// The upstream provider contract.
pub mod provider;
/// Asset-class guessing for symbols without a hint.
pub mod registry;
/// Symbol normalization.
pub mod symbol;
/// Cached value enum.
pub mod value;

pub use provider::{BatchResults, PriceProvider};
pub use registry::SymbolRegistry;
pub use symbol::{normalize_symbol, normalize_symbols};
pub use value::MarketValue;

pub use pricefeed_types::*;
