//! Cache keys are colon-delimited and always start with `market:`.
//!
//! ```text
//! market:price:<class>:<SYMBOL>
//! market:snapshot:<class>:<SYMBOL>
//! market:historical:<class>:<SYMBOL>:<period>
//! market:directory:<class>
//! ```
//!
//! Symbols passed here must already be normalized.

use pricefeed_types::{AssetClass, DataCategory, HistoryPeriod};

/// Pattern matching every market-data key.
pub const MARKET_NAMESPACE: &str = "market:*";

/// Key for a live quote.
#[must_use]
pub fn price_key(class: AssetClass, symbol: &str) -> String {
    format!("market:price:{class}:{symbol}")
}

/// Key for a detailed snapshot.
#[must_use]
pub fn snapshot_key(class: AssetClass, symbol: &str) -> String {
    format!("market:snapshot:{class}:{symbol}")
}

/// Key for a historical series.
#[must_use]
pub fn historical_key(class: AssetClass, symbol: &str, period: HistoryPeriod) -> String {
    format!("market:historical:{class}:{symbol}:{period}")
}

/// Key for a class directory.
#[must_use]
pub fn directory_key(class: AssetClass) -> String {
    format!("market:directory:{class}")
}

/// Patterns covering every entry stored for one symbol, across all classes.
#[must_use]
pub fn symbol_patterns(symbol: &str) -> [String; 3] {
    [
        format!("market:price:*:{symbol}"),
        format!("market:snapshot:*:{symbol}"),
        format!("market:historical:*:{symbol}:*"),
    ]
}

/// Data category a key belongs to, if it is a market key.
#[must_use]
pub fn category_of(key: &str) -> Option<DataCategory> {
    let mut parts = key.split(':');
    if parts.next() != Some("market") {
        return None;
    }
    match parts.next()? {
        "price" => Some(DataCategory::Quote),
        "snapshot" => Some(DataCategory::Snapshot),
        "historical" => Some(DataCategory::Historical),
        "directory" => Some(DataCategory::Directory),
        _ => None,
    }
}
