use std::collections::HashMap;

use async_trait::async_trait;

use pricefeed_types::{
    AssetClass, HistoryPeriod, ListingEntry, PricePoint, PriceRecord, PricefeedError, ProviderKey,
};

/// Per-symbol results of a batch call, keyed by the requested symbol.
///
/// A requested symbol absent from the map is treated as `NotFound`.
pub type BatchResults = HashMap<String, Result<PriceRecord, PricefeedError>>;

/// An upstream price source.
///
/// Implementations own their wire format: raw responses are deserialized into
/// provider-specific types and normalized into [`PriceRecord`] before leaving the
/// adapter. A failure is an ordinary per-symbol outcome; the caller decides
/// whether to fall back to another provider.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Stable identifier used in chain configuration and provenance.
    fn name(&self) -> &'static str;

    /// Canonical key constructed from the static name.
    fn key(&self) -> ProviderKey {
        ProviderKey::new(self.name())
    }

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Whether this provider claims to serve a class.
    ///
    /// Default: `false` for all classes. Providers must opt in explicitly.
    fn supports_class(&self, class: AssetClass) -> bool {
        let _ = class;
        false
    }

    /// Symbols per upstream request.
    ///
    /// `1` means the provider has no batch endpoint and batches degrade to
    /// bounded parallel single calls.
    fn batch_size(&self) -> usize {
        1
    }

    /// Fetch a live quote for one canonical symbol.
    async fn fetch(&self, symbol: &str, class: AssetClass) -> Result<PriceRecord, PricefeedError>;

    /// Fetch live quotes for several canonical symbols in one upstream round-trip.
    ///
    /// Default: concurrent single fetches.
    async fn fetch_batch(&self, symbols: &[String], class: AssetClass) -> BatchResults {
        let calls = symbols.iter().map(|s| async move {
            let r = self.fetch(s, class).await;
            (s.clone(), r)
        });
        futures::future::join_all(calls).await.into_iter().collect()
    }

    /// Fetch a detailed snapshot.
    ///
    /// Default: the live quote.
    async fn fetch_snapshot(
        &self,
        symbol: &str,
        class: AssetClass,
    ) -> Result<PriceRecord, PricefeedError> {
        self.fetch(symbol, class).await
    }

    /// Fetch a historical close series.
    async fn fetch_history(
        &self,
        symbol: &str,
        class: AssetClass,
        period: HistoryPeriod,
    ) -> Result<Vec<PricePoint>, PricefeedError> {
        let _ = (symbol, class, period);
        Err(PricefeedError::unsupported("history"))
    }

    /// Fetch the list of symbols this provider knows for a class.
    async fn fetch_directory(&self, class: AssetClass) -> Result<Vec<ListingEntry>, PricefeedError> {
        let _ = class;
        Err(PricefeedError::unsupported("directory"))
    }
}
