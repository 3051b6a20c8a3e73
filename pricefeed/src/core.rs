use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pricefeed_cache::{Clock, TtlCache};
use pricefeed_core::{
    AssetClass, CacheConfig, CacheStats, MarketValue, PriceProvider, PricefeedConfig,
    PricefeedError, ProviderKey, SymbolRegistry,
};
use tokio::sync::Semaphore;

/// Façade that answers price lookups from the cache or through provider chains.
pub struct Pricefeed {
    pub(crate) chains: HashMap<AssetClass, Vec<Arc<dyn PriceProvider>>>,
    pub(crate) cfg: PricefeedConfig,
    pub(crate) cache: Arc<TtlCache<MarketValue>>,
    pub(crate) registry: SymbolRegistry,
    pub(crate) permits: Arc<Semaphore>,
}

impl std::fmt::Debug for Pricefeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chains: HashMap<AssetClass, Vec<&'static str>> = self
            .chains
            .iter()
            .map(|(class, chain)| (*class, chain.iter().map(|p| p.name()).collect()))
            .collect();
        f.debug_struct("Pricefeed")
            .field("chains", &chains)
            .field("cfg", &self.cfg)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`Pricefeed`].
pub struct PricefeedBuilder {
    providers: Vec<Arc<dyn PriceProvider>>,
    cfg: PricefeedConfig,
    clock: Option<Arc<dyn Clock>>,
    cache: Option<Arc<TtlCache<MarketValue>>>,
    registry: SymbolRegistry,
}

impl Default for PricefeedBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PricefeedBuilder {
    /// Create a builder with default configuration and no providers.
    ///
    /// Defaults: 30s quote TTL, 60s snapshot TTL, 24h directory TTL, 60min
    /// historical TTL, 10s provider timeout, at most 4 provider calls in flight.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: vec![],
            cfg: PricefeedConfig::default(),
            clock: None,
            cache: None,
            registry: SymbolRegistry::new(),
        }
    }

    /// Register a provider.
    ///
    /// Registration order is the chain order for classes without an explicit
    /// chain.
    #[must_use]
    pub fn with_provider(mut self, p: Arc<dyn PriceProvider>) -> Self {
        self.providers.push(p);
        self
    }

    /// Set the ordered provider chain for an asset class.
    ///
    /// Only the listed providers are consulted for that class.
    #[must_use]
    pub fn chain_for(mut self, class: AssetClass, keys: &[ProviderKey]) -> Self {
        self.cfg
            .chains
            .insert(class, keys.iter().map(|k| k.as_str().to_string()).collect());
        self
    }

    /// Replace the whole configuration, e.g. one loaded with
    /// [`PricefeedConfig::from_json_str`].
    #[must_use]
    pub fn config(mut self, cfg: PricefeedConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Set the TTL table and sweep cadence.
    #[must_use]
    pub fn cache_config(mut self, cache: CacheConfig) -> Self {
        self.cfg.cache = cache;
        self
    }

    /// Set the per-provider-call timeout.
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.provider_timeout = timeout;
        self
    }

    /// Bound the number of provider calls executing at once.
    #[must_use]
    pub const fn max_in_flight(mut self, n: usize) -> Self {
        self.cfg.max_in_flight = n;
        self
    }

    /// Override the chunk size used when batching symbols for a provider.
    #[must_use]
    pub fn chunk_size(mut self, key: ProviderKey, n: usize) -> Self {
        self.cfg.chunk_sizes.insert(key.as_str().to_string(), n);
        self
    }

    /// Use a custom time source for cache expiry.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an existing market cache instead of creating one.
    ///
    /// The cache's own clock and sweep settings win over [`clock`](Self::clock)
    /// and the configured sweep interval.
    #[must_use]
    pub fn cache(mut self, cache: Arc<TtlCache<MarketValue>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the known-symbol registry used to guess asset classes.
    #[must_use]
    pub fn registry(mut self, registry: SymbolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build the façade.
    ///
    /// Starts the cache sweep when called inside a Tokio runtime.
    ///
    /// # Errors
    /// Returns `Config` if no providers are registered, two providers share a
    /// name, a chain or chunk override names an unknown provider, a chained
    /// provider does not support its class, or a bound is zero.
    pub fn build(self) -> Result<Pricefeed, PricefeedError> {
        if self.providers.is_empty() {
            return Err(PricefeedError::config(
                "no providers registered; add at least one via with_provider(...)",
            ));
        }
        self.cfg.validate()?;

        let mut by_name: HashMap<&'static str, Arc<dyn PriceProvider>> = HashMap::new();
        for p in &self.providers {
            if by_name.insert(p.name(), Arc::clone(p)).is_some() {
                return Err(PricefeedError::config(format!(
                    "provider {} registered twice",
                    p.name()
                )));
            }
        }
        if let Some(name) = self
            .cfg
            .chunk_sizes
            .keys()
            .find(|n| !by_name.contains_key(n.as_str()))
        {
            return Err(PricefeedError::config(format!(
                "chunk size set for unknown provider {name}"
            )));
        }

        let mut chains = HashMap::with_capacity(AssetClass::ALL.len());
        for class in AssetClass::ALL {
            let chain = match self.cfg.chains.get(&class) {
                Some(names) => {
                    let mut seen = HashSet::new();
                    let mut chain = Vec::with_capacity(names.len());
                    for name in names.iter().filter(|n| seen.insert(n.as_str())) {
                        let p = by_name.get(name.as_str()).ok_or_else(|| {
                            PricefeedError::config(format!(
                                "{class} chain names unknown provider {name}"
                            ))
                        })?;
                        if !p.supports_class(class) {
                            return Err(PricefeedError::config(format!(
                                "provider {name} does not support {class}"
                            )));
                        }
                        chain.push(Arc::clone(p));
                    }
                    chain
                }
                None => self
                    .providers
                    .iter()
                    .filter(|p| p.supports_class(class))
                    .cloned()
                    .collect(),
            };
            chains.insert(class, chain);
        }

        let cache = self.cache.unwrap_or_else(|| {
            let mut b = TtlCache::<MarketValue>::builder()
                .sweep_interval(self.cfg.cache.sweep_interval().unwrap_or(Duration::ZERO));
            if let Some(clock) = self.clock {
                b = b.clock(clock);
            }
            b.build()
        });

        Ok(Pricefeed {
            chains,
            permits: Arc::new(Semaphore::new(
                self.cfg.max_in_flight.min(Semaphore::MAX_PERMITS),
            )),
            cfg: self.cfg,
            cache,
            registry: self.registry,
        })
    }
}

/// Attach the provider name to errors that do not already carry one.
pub fn tag_err(provider: &str, e: PricefeedError) -> PricefeedError {
    match e {
        e @ (PricefeedError::NotFound { .. }
        | PricefeedError::ProviderTimeout { .. }
        | PricefeedError::Provider { .. }
        | PricefeedError::RateLimited { .. }
        | PricefeedError::AllProvidersTimedOut { .. }
        | PricefeedError::AllProvidersFailed(_)) => e,
        other => PricefeedError::provider(provider, other.to_string()),
    }
}

impl Pricefeed {
    /// Start building a new `Pricefeed`.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use pricefeed::{AssetClass, Pricefeed};
    /// use pricefeed_providers::{CoinGeckoProvider, YahooProvider};
    ///
    /// let feed = Pricefeed::builder()
    ///     .with_provider(Arc::new(CoinGeckoProvider::new()))
    ///     .with_provider(Arc::new(YahooProvider::new()))
    ///     .chain_for(AssetClass::Crypto, &[CoinGeckoProvider::KEY, YahooProvider::KEY])
    ///     .build()?;
    /// let btc = feed.fetch_one("btc", Some(AssetClass::Crypto)).await?;
    /// ```
    #[must_use]
    pub fn builder() -> PricefeedBuilder {
        PricefeedBuilder::new()
    }

    /// Resolved provider chain for a class.
    pub(crate) fn chain(&self, class: AssetClass) -> &[Arc<dyn PriceProvider>] {
        self.chains.get(&class).map_or(&[][..], Vec::as_slice)
    }

    /// Names of the providers consulted for a class, in order.
    #[must_use]
    pub fn chain_names(&self, class: AssetClass) -> Vec<&'static str> {
        self.chain(class).iter().map(|p| p.name()).collect()
    }

    /// Symbols per request for a provider, honoring configured overrides.
    pub(crate) fn chunk_size_for(&self, p: &dyn PriceProvider) -> usize {
        self.cfg
            .chunk_sizes
            .get(p.name())
            .copied()
            .unwrap_or_else(|| p.batch_size())
            .max(1)
    }

    /// Run one provider call under the in-flight bound and the provider timeout.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "pricefeed::core::provider_call",
            skip_all,
            fields(provider = provider, capability = capability),
        )
    )]
    pub(crate) async fn provider_call<T, Fut>(
        &self,
        provider: &'static str,
        capability: &'static str,
        fut: Fut,
    ) -> Result<T, PricefeedError>
    where
        Fut: Future<Output = Result<T, PricefeedError>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PricefeedError::Other("provider permits closed".into()))?;
        match tokio::time::timeout(self.cfg.provider_timeout, fut).await {
            Ok(res) => res,
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(provider, capability, "provider call timed out");
                Err(PricefeedError::provider_timeout(provider, capability))
            }
        }
    }

    /// Walk the chain for `class` until one provider answers.
    ///
    /// Providers answering `Unsupported` are skipped and do not count as
    /// attempts. Failures are collapsed with [`collapse_errors`](crate::collapse_errors).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "pricefeed::core::fetch_single",
            skip_all,
            fields(class = %class, capability = capability, what = %what),
        )
    )]
    pub(crate) async fn fetch_single<T, F, Fut>(
        &self,
        class: AssetClass,
        capability: &'static str,
        what: String,
        call: F,
    ) -> Result<T, PricefeedError>
    where
        F: Fn(Arc<dyn PriceProvider>) -> Fut,
        Fut: Future<Output = Result<T, PricefeedError>>,
    {
        let mut attempted_any = false;
        let mut errors: Vec<PricefeedError> = Vec::new();

        for p in self.chain(class) {
            match self
                .provider_call(p.name(), capability, call(Arc::clone(p)))
                .await
            {
                Ok(v) => return Ok(v),
                Err(PricefeedError::Unsupported { .. }) => {}
                Err(e) => {
                    attempted_any = true;
                    #[cfg(feature = "tracing")]
                    tracing::debug!(provider = p.name(), error = %e, "provider failed; trying next");
                    errors.push(tag_err(p.name(), e));
                }
            }
        }

        Err(crate::router::util::collapse_errors(
            capability,
            attempted_any,
            errors,
            Some(what),
        ))
    }

    /// Usage counters of the market cache.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Zero the market cache counters.
    pub fn reset_stats(&self) {
        self.cache.reset_stats();
    }

    /// The market cache shared by every lookup.
    #[must_use]
    pub const fn cache(&self) -> &Arc<TtlCache<MarketValue>> {
        &self.cache
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PricefeedConfig {
        &self.cfg
    }

    /// Known-symbol registry used when no class hint is given.
    #[must_use]
    pub const fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    /// Stop background work owned by the façade.
    pub async fn shutdown(&self) {
        self.cache.shutdown().await;
    }
}
