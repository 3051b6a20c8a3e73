use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pricefeed::{AssetClass, PriceProvider, PriceRecord, PricefeedError};
use rust_decimal::Decimal;

use crate::helpers::{builder, syms};

/// Single-symbol provider that records how many fetches overlap.
#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl PriceProvider for Gauge {
    fn name(&self) -> &'static str {
        "gauge"
    }

    fn supports_class(&self, _class: AssetClass) -> bool {
        true
    }

    async fn fetch(&self, symbol: &str, class: AssetClass) -> Result<PriceRecord, PricefeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(PriceRecord::new(symbol, class, Decimal::ONE, "gauge"))
    }
}

#[tokio::test(start_paused = true)]
async fn batch_respects_max_in_flight() {
    let gauge = Arc::new(Gauge::default());
    let feed = builder()
        .with_provider(gauge.clone())
        .max_in_flight(2)
        .build()
        .unwrap();

    let out = feed
        .fetch_many(&syms("G", 12), Some(AssetClass::Equity))
        .await
        .unwrap();

    assert_eq!(out.fetched_count, 12);
    assert_eq!(gauge.calls.load(Ordering::SeqCst), 12);
    let peak = gauge.peak.load(Ordering::SeqCst);
    assert!(peak <= 2, "peak concurrency {peak} exceeded the bound");
    assert!(peak >= 1);
}

#[tokio::test(start_paused = true)]
async fn single_lookups_share_the_same_bound() {
    let gauge = Arc::new(Gauge::default());
    let feed = Arc::new(
        builder()
            .with_provider(gauge.clone())
            .max_in_flight(3)
            .build()
            .unwrap(),
    );

    let calls = syms("S", 9).into_iter().map(|s| {
        let feed = Arc::clone(&feed);
        async move { feed.quote(&s, AssetClass::Equity).await }
    });
    for r in futures::future::join_all(calls).await {
        r.unwrap();
    }

    assert_eq!(gauge.calls.load(Ordering::SeqCst), 9);
    assert!(gauge.peak.load(Ordering::SeqCst) <= 3);
}
