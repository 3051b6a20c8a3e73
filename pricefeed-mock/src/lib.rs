use std::time::Duration;

use async_trait::async_trait;
use pricefeed_core::{
    AssetClass, HistoryPeriod, ListingEntry, PriceProvider, PricePoint, PriceRecord, PricefeedError,
};

mod dynamic;
mod fixtures;

pub use dynamic::{DynamicMockBuilder, DynamicMockController, DynamicMockProvider, MockBehavior};

/// Mock provider for CI-safe examples. Serves deterministic data from static fixtures.
///
/// Two symbols are special: `FAIL` always fails with a provider error and
/// `TIMEOUT` stalls briefly before answering not-found, which trips short
/// provider timeouts.
pub struct MockProvider;

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    async fn maybe_fail_or_timeout(symbol: &str, capability: &'static str) -> Result<(), PricefeedError> {
        match symbol {
            "FAIL" => Err(PricefeedError::provider(
                fixtures::PROVIDER,
                format!("forced failure: {capability}"),
            )),
            "TIMEOUT" => {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_class(record: PriceRecord, class: AssetClass) -> Result<PriceRecord, PricefeedError> {
        if record.asset_class() == class {
            Ok(record)
        } else {
            Err(PricefeedError::not_found(format!(
                "{class} quote for {}",
                record.symbol()
            )))
        }
    }
}

#[async_trait]
impl PriceProvider for MockProvider {
    fn name(&self) -> &'static str {
        fixtures::PROVIDER
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn supports_class(&self, _class: AssetClass) -> bool {
        true
    }

    async fn fetch(&self, symbol: &str, class: AssetClass) -> Result<PriceRecord, PricefeedError> {
        Self::maybe_fail_or_timeout(symbol, "quote").await?;
        let record = fixtures::quotes::by_symbol(symbol)
            .ok_or_else(|| PricefeedError::not_found(format!("quote for {symbol}")))?;
        Self::check_class(record, class)
    }

    async fn fetch_snapshot(
        &self,
        symbol: &str,
        class: AssetClass,
    ) -> Result<PriceRecord, PricefeedError> {
        Self::maybe_fail_or_timeout(symbol, "snapshot").await?;
        let record = fixtures::quotes::snapshot_by_symbol(symbol)
            .ok_or_else(|| PricefeedError::not_found(format!("snapshot for {symbol}")))?;
        Self::check_class(record, class)
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        _class: AssetClass,
        period: HistoryPeriod,
    ) -> Result<Vec<PricePoint>, PricefeedError> {
        Self::maybe_fail_or_timeout(symbol, "history").await?;
        fixtures::history::by_symbol(symbol, period)
            .ok_or_else(|| PricefeedError::not_found(format!("history for {symbol}")))
    }

    async fn fetch_directory(&self, class: AssetClass) -> Result<Vec<ListingEntry>, PricefeedError> {
        let out: Vec<ListingEntry> = fixtures::quotes::by_class(class)
            .map(|(symbol, name)| ListingEntry {
                symbol: symbol.to_string(),
                display_name: name.to_string(),
                asset_class: class,
            })
            .collect();
        if out.is_empty() {
            return Err(PricefeedError::not_found(format!("{class} directory")));
        }
        Ok(out)
    }
}
