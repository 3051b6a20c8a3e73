use pricefeed_core::{
    AssetClass, DataCategory, MarketValue, PriceRecord, PricefeedError, keys, normalize_symbol,
};

use crate::Pricefeed;

impl Pricefeed {
    /// Fetch a live quote for one symbol of a known class.
    ///
    /// Served from the cache while fresh; otherwise the class chain is walked in
    /// order and the first answer is cached with the quote TTL. Concurrent
    /// callers for the same symbol share one provider fetch.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a malformed symbol, or the collapsed chain
    /// failure: `NotFound`, `AllProvidersTimedOut`, `AllProvidersFailed`, or
    /// `Unsupported` when no provider serves the class.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "pricefeed::router::quote", skip(self))
    )]
    pub async fn quote(&self, symbol: &str, class: AssetClass) -> Result<PriceRecord, PricefeedError> {
        let symbol = normalize_symbol(symbol)?;
        self.quote_normalized(&symbol, class).await
    }

    async fn quote_normalized(
        &self,
        symbol: &str,
        class: AssetClass,
    ) -> Result<PriceRecord, PricefeedError> {
        let key = keys::price_key(class, symbol);
        let ttl = self.cfg.cache.ttl_for(DataCategory::Quote);
        let value = self
            .cache
            .wrap(&key, ttl, || {
                self.fetch_single(class, "quote", format!("quote for {symbol}"), |p| {
                    let symbol = symbol.to_string();
                    async move { p.fetch(&symbol, class).await.map(MarketValue::Price) }
                })
            })
            .await?;
        value
            .into_price()
            .ok_or_else(|| PricefeedError::Data(format!("{key} holds a non-quote value")))
    }

    /// Fetch a live quote, guessing the class when no hint is given.
    ///
    /// With a hint only that class is consulted. Without one, the known-symbol
    /// registry picks the first class to try and the remaining classes follow in
    /// the fixed order crypto, equity, forex, commodity, index.
    ///
    /// Provider failures are not errors here: a symbol nobody can price
    /// yields `Ok(None)`.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a malformed symbol.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "pricefeed::router::fetch_one", skip(self))
    )]
    pub async fn fetch_one(
        &self,
        symbol: &str,
        hint: Option<AssetClass>,
    ) -> Result<Option<PriceRecord>, PricefeedError> {
        let symbol = normalize_symbol(symbol)?;
        let classes = match hint {
            Some(c) => vec![c],
            None => {
                let candidates = self.registry.candidates(&symbol);
                if let Some(r) = self.cached_quote(&symbol, &candidates) {
                    return Ok(Some(r));
                }
                candidates
            }
        };
        for class in classes {
            match self.quote_normalized(&symbol, class).await {
                Ok(r) => return Ok(Some(r)),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(symbol = %symbol, class = %class, error = %_e, "no quote under class");
                }
            }
        }
        Ok(None)
    }

    /// Live cached quote for `symbol` under the first class that holds one.
    ///
    /// Only a found entry touches the hit counter.
    pub(crate) fn cached_quote(&self, symbol: &str, classes: &[AssetClass]) -> Option<PriceRecord> {
        classes.iter().find_map(|class| {
            let key = keys::price_key(*class, symbol);
            if !self.cache.has(&key) {
                return None;
            }
            self.cache.get(&key).and_then(MarketValue::into_price)
        })
    }

    /// Drop cached market data.
    ///
    /// With a symbol, removes its quote, snapshot and history entries under
    /// every class. Without one, clears the whole market namespace. Returns the
    /// number of entries removed.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a malformed symbol.
    pub fn invalidate(&self, symbol: Option<&str>) -> Result<usize, PricefeedError> {
        let removed = match symbol {
            Some(raw) => {
                let symbol = normalize_symbol(raw)?;
                keys::symbol_patterns(&symbol)
                    .iter()
                    .map(|p| self.cache.clear_pattern(p))
                    .sum()
            }
            None => self.cache.clear_pattern(keys::MARKET_NAMESPACE),
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(symbol = ?symbol, removed, "invalidated market cache");
        Ok(removed)
    }
}
