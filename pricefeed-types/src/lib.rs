//! Pricefeed-specific data transfer objects and configuration primitives.
#![warn(missing_docs)]

mod asset;
mod config;
mod error;
mod provider;
mod record;
mod reports;
mod stats;

pub use asset::{AssetClass, DataCategory, HistoryPeriod};
pub use config::{CacheConfig, PricefeedConfig};
pub use error::PricefeedError;
pub use provider::ProviderKey;
pub use record::{AuxValue, ListingEntry, PricePoint, PriceRecord};
pub use reports::BatchOutcome;
pub use stats::CacheStats;
