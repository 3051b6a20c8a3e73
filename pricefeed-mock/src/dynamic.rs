use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use pricefeed_core::{
    AssetClass, BatchResults, HistoryPeriod, ListingEntry, PriceProvider, PricePoint, PriceRecord,
    PricefeedError,
};

/// Instruction for how a method should behave for a given input.
#[derive(Debug, Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(PricefeedError),
    /// Hang indefinitely (simulate a timeout).
    Hang,
}

#[derive(Default)]
struct InternalState {
    quote_rules: HashMap<String, MockBehavior<PriceRecord>>,
    history_rules: HashMap<String, MockBehavior<Vec<PricePoint>>>,
    directory_rules: HashMap<AssetClass, MockBehavior<Vec<ListingEntry>>>,
    // Price served for symbols without a quote rule.
    default_price: Option<Decimal>,
    latency: Duration,
    // One entry per upstream request, holding the symbols it carried.
    request_log: Vec<Vec<String>>,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
#[derive(Clone)]
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the behavior for quote calls for a specific symbol.
    pub async fn set_quote_behavior(&self, symbol: &str, behavior: MockBehavior<PriceRecord>) {
        let mut guard = self.state.lock().await;
        guard.quote_rules.insert(symbol.to_string(), behavior);
    }

    /// Set the behavior for history calls for a specific symbol.
    pub async fn set_history_behavior(&self, symbol: &str, behavior: MockBehavior<Vec<PricePoint>>) {
        let mut guard = self.state.lock().await;
        guard.history_rules.insert(symbol.to_string(), behavior);
    }

    /// Set the behavior for directory calls for a class.
    pub async fn set_directory_behavior(
        &self,
        class: AssetClass,
        behavior: MockBehavior<Vec<ListingEntry>>,
    ) {
        let mut guard = self.state.lock().await;
        guard.directory_rules.insert(class, behavior);
    }

    /// Answer every symbol without a quote rule with a synthetic record at `price`.
    pub async fn serve_any(&self, price: Decimal) {
        self.state.lock().await.default_price = Some(price);
    }

    /// Delay every upstream request by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        self.state.lock().await.latency = latency;
    }

    /// Number of upstream requests made so far (a batch request counts once).
    pub async fn request_count(&self) -> usize {
        self.state.lock().await.request_log.len()
    }

    /// Symbols carried by each upstream request, in call order.
    pub async fn request_log(&self) -> Vec<Vec<String>> {
        self.state.lock().await.request_log.clone()
    }

    /// Every symbol requested so far, flattened.
    pub async fn requested_symbols(&self) -> Vec<String> {
        let guard = self.state.lock().await;
        guard.request_log.iter().flatten().cloned().collect()
    }

    /// How many times `symbol` was requested.
    pub async fn times_requested(&self, symbol: &str) -> usize {
        let guard = self.state.lock().await;
        guard
            .request_log
            .iter()
            .flatten()
            .filter(|s| *s == symbol)
            .count()
    }

    /// Forget the request log, keeping behaviors.
    pub async fn reset_log(&self) {
        self.state.lock().await.request_log.clear();
    }

    /// Clear all configured behaviors and request logs.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        guard.quote_rules.clear();
        guard.history_rules.clear();
        guard.directory_rules.clear();
        guard.default_price = None;
        guard.latency = Duration::ZERO;
        guard.request_log.clear();
    }
}

/// A provider that defers all behavior to an external controller.
pub struct DynamicMockProvider {
    name: &'static str,
    batch_size: usize,
    classes: Option<HashSet<AssetClass>>,
    state: Arc<Mutex<InternalState>>,
}

/// Builder for [`DynamicMockProvider`].
pub struct DynamicMockBuilder {
    name: &'static str,
    batch_size: usize,
    classes: Option<HashSet<AssetClass>>,
}

impl DynamicMockBuilder {
    /// Symbols per upstream request; `1` disables the batch endpoint.
    #[must_use]
    pub const fn batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    /// Restrict the classes the provider claims to support. Default: all.
    #[must_use]
    pub fn classes<I: IntoIterator<Item = AssetClass>>(mut self, classes: I) -> Self {
        self.classes = Some(classes.into_iter().collect());
        self
    }

    /// Build the provider and its controller.
    #[must_use]
    pub fn build(self) -> (Arc<dyn PriceProvider>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(DynamicMockProvider {
            name: self.name,
            batch_size: self.batch_size.max(1),
            classes: self.classes,
            state,
        });
        (me as Arc<dyn PriceProvider>, controller)
    }
}

impl DynamicMockProvider {
    /// Start building a dynamic mock.
    #[must_use]
    pub const fn builder(name: &'static str) -> DynamicMockBuilder {
        DynamicMockBuilder {
            name,
            batch_size: 1,
            classes: None,
        }
    }

    /// Create a single-symbol dynamic mock supporting every class, and its controller.
    #[must_use]
    pub fn new_with_controller(name: &'static str) -> (Arc<dyn PriceProvider>, DynamicMockController) {
        Self::builder(name).build()
    }

    /// Log the request and return the latency to apply.
    async fn record(&self, symbols: Vec<String>) -> Duration {
        let mut guard = self.state.lock().await;
        guard.request_log.push(symbols);
        guard.latency
    }

    fn resolve(
        &self,
        state: &InternalState,
        symbol: &str,
        class: AssetClass,
    ) -> Option<MockBehavior<PriceRecord>> {
        if let Some(rule) = state.quote_rules.get(symbol) {
            return Some(rule.clone());
        }
        state.default_price.map(|price| {
            MockBehavior::Return(PriceRecord::new(symbol, class, price, self.name))
        })
    }

    fn not_found(symbol: &str) -> PricefeedError {
        PricefeedError::not_found(format!("quote for {symbol}"))
    }
}

async fn hang<T>() -> T {
    std::future::pending::<T>().await
}

#[async_trait]
impl PriceProvider for DynamicMockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
    }

    fn supports_class(&self, class: AssetClass) -> bool {
        self.classes.as_ref().is_none_or(|c| c.contains(&class))
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn fetch(&self, symbol: &str, class: AssetClass) -> Result<PriceRecord, PricefeedError> {
        let latency = self.record(vec![symbol.to_string()]).await;
        // Acquire behavior snapshot without holding the lock across await points
        let behavior = {
            let guard = self.state.lock().await;
            self.resolve(&guard, symbol, class)
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match behavior {
            Some(MockBehavior::Return(q)) => Ok(q),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => hang().await,
            None => Err(Self::not_found(symbol)),
        }
    }

    async fn fetch_batch(&self, symbols: &[String], class: AssetClass) -> BatchResults {
        let latency = self.record(symbols.to_vec()).await;
        let behaviors: Vec<_> = {
            let guard = self.state.lock().await;
            symbols
                .iter()
                .map(|s| (s.clone(), self.resolve(&guard, s, class)))
                .collect()
        };
        // One upstream request: any hanging symbol stalls the whole request.
        if behaviors
            .iter()
            .any(|(_, b)| matches!(b, Some(MockBehavior::Hang)))
        {
            return hang().await;
        }
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        behaviors
            .into_iter()
            .filter_map(|(symbol, behavior)| match behavior {
                Some(MockBehavior::Return(q)) => Some((symbol, Ok(q))),
                Some(MockBehavior::Fail(e)) => Some((symbol, Err(e))),
                // Omitted symbols read as not found.
                _ => None,
            })
            .collect()
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        _class: AssetClass,
        _period: HistoryPeriod,
    ) -> Result<Vec<PricePoint>, PricefeedError> {
        let latency = self.record(vec![symbol.to_string()]).await;
        let behavior = {
            let guard = self.state.lock().await;
            guard.history_rules.get(symbol).cloned()
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match behavior {
            Some(MockBehavior::Return(resp)) => Ok(resp),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => hang().await,
            None => Err(PricefeedError::unsupported("history")),
        }
    }

    async fn fetch_directory(&self, class: AssetClass) -> Result<Vec<ListingEntry>, PricefeedError> {
        let latency = self.record(Vec::new()).await;
        let behavior = {
            let guard = self.state.lock().await;
            guard.directory_rules.get(&class).cloned()
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match behavior {
            Some(MockBehavior::Return(list)) => Ok(list),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => hang().await,
            None => Err(PricefeedError::unsupported("directory")),
        }
    }
}
