use std::sync::Arc;

use pricefeed::{AssetClass, PriceProvider, PricePoint, Pricefeed, PricefeedBuilder, PriceRecord};
use pricefeed_mock::{DynamicMockController, DynamicMockProvider};
use rust_decimal::Decimal;

// ---------- Lightweight fixtures and helpers for tests ----------

/// Common symbol constants used across tests.
pub const AAPL: &str = "AAPL";
#[allow(dead_code)]
pub const MSFT: &str = "MSFT";
#[allow(dead_code)]
pub const BTC: &str = "BTC";
#[allow(dead_code)]
pub const ETH: &str = "ETH";

/// Build a fixed quote so records compare equal across calls.
pub fn rec(symbol: &str, class: AssetClass, price: i64, provider: &str) -> PriceRecord {
    PriceRecord::new(symbol, class, Decimal::from(price), provider)
        .with_observed_at(chrono_anchor())
}

#[allow(dead_code)]
pub fn point(day: i64, close: i64) -> PricePoint {
    PricePoint {
        ts: chrono_anchor() + chrono::Duration::days(day),
        close: Decimal::from(close),
        volume: None,
    }
}

fn chrono_anchor() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(1_717_000_000, 0).unwrap()
}

/// A mock that answers every symbol at `price`.
pub async fn serving(
    name: &'static str,
    batch: usize,
    price: i64,
) -> (Arc<dyn PriceProvider>, DynamicMockController) {
    let (p, ctl) = DynamicMockProvider::builder(name).batch_size(batch).build();
    ctl.serve_any(Decimal::from(price)).await;
    (p, ctl)
}

/// Builder with the sweep disabled so tests own all timing.
pub fn builder() -> PricefeedBuilder {
    Pricefeed::builder().cache_config(pricefeed::CacheConfig {
        sweep_interval_ms: 0,
        ..pricefeed::CacheConfig::default()
    })
}

/// Owned symbol list.
#[allow(dead_code)]
pub fn syms(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix}{i}")).collect()
}
