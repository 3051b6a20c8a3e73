use std::sync::Arc;

use pricefeed_core::{
    AssetClass, DataCategory, HistoryPeriod, ListingEntry, MarketValue, PricePoint, PriceRecord,
    PricefeedError, keys, normalize_symbol,
};

use crate::Pricefeed;

fn mismatch(key: &str) -> PricefeedError {
    PricefeedError::Data(format!("{key} holds a value of another category"))
}

impl Pricefeed {
    /// Detailed market snapshot with auxiliary fields.
    ///
    /// Cached under the snapshot TTL. Providers without a dedicated snapshot
    /// endpoint answer with their quote.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a malformed symbol or the collapsed chain failure.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "pricefeed::router::snapshot", skip(self))
    )]
    pub async fn snapshot(
        &self,
        symbol: &str,
        class: AssetClass,
    ) -> Result<PriceRecord, PricefeedError> {
        let symbol = normalize_symbol(symbol)?;
        let key = keys::snapshot_key(class, &symbol);
        let ttl = self.cfg.cache.ttl_for(DataCategory::Snapshot);
        let value = self
            .cache
            .wrap(&key, ttl, || {
                self.fetch_single(class, "snapshot", format!("snapshot for {symbol}"), |p| {
                    let symbol = symbol.clone();
                    async move {
                        p.fetch_snapshot(&symbol, class)
                            .await
                            .map(MarketValue::Snapshot)
                    }
                })
            })
            .await?;
        value.into_snapshot().ok_or_else(|| mismatch(&key))
    }

    /// Historical close series for a lookback period.
    ///
    /// An empty series counts as not found and moves on to the next provider.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a malformed symbol or the collapsed chain failure.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "pricefeed::router::history", skip(self))
    )]
    pub async fn history(
        &self,
        symbol: &str,
        class: AssetClass,
        period: HistoryPeriod,
    ) -> Result<Vec<PricePoint>, PricefeedError> {
        let symbol = normalize_symbol(symbol)?;
        let key = keys::historical_key(class, &symbol, period);
        let ttl = self.cfg.cache.ttl_for(DataCategory::Historical);
        let value = self
            .cache
            .wrap(&key, ttl, || {
                self.fetch_single(class, "history", format!("history for {symbol}"), |p| {
                    let symbol = symbol.clone();
                    async move {
                        let points = p.fetch_history(&symbol, class, period).await?;
                        if points.is_empty() {
                            return Err(PricefeedError::not_found(format!("history for {symbol}")));
                        }
                        Ok(MarketValue::History(Arc::new(points)))
                    }
                })
            })
            .await?;
        value
            .into_history()
            .map(Arc::unwrap_or_clone)
            .ok_or_else(|| mismatch(&key))
    }

    /// Listing of the symbols a class offers.
    ///
    /// # Errors
    /// Returns the collapsed chain failure.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "pricefeed::router::directory", skip(self))
    )]
    pub async fn directory(&self, class: AssetClass) -> Result<Vec<ListingEntry>, PricefeedError> {
        let key = keys::directory_key(class);
        let ttl = self.cfg.cache.ttl_for(DataCategory::Directory);
        let value = self
            .cache
            .wrap(&key, ttl, || {
                self.fetch_single(class, "directory", format!("{class} directory"), |p| async move {
                    let list = p.fetch_directory(class).await?;
                    if list.is_empty() {
                        return Err(PricefeedError::not_found(format!("{class} directory")));
                    }
                    Ok(MarketValue::Directory(Arc::new(list)))
                })
            })
            .await?;
        value
            .into_directory()
            .map(Arc::unwrap_or_clone)
            .ok_or_else(|| mismatch(&key))
    }
}
