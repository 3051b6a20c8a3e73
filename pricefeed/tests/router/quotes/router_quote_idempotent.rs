use std::sync::Arc;
use std::time::Duration;

use pricefeed::{AssetClass, ManualClock, MarketValue, TtlCache};

use crate::helpers::{BTC, builder, serving};

#[tokio::test]
async fn repeated_lookup_is_served_from_cache() {
    let (p, ctl) = serving("cg", 1, 65_000).await;
    let feed = builder().with_provider(p).build().unwrap();

    let first = feed.fetch_one(BTC, Some(AssetClass::Crypto)).await.unwrap();
    let second = feed.fetch_one("btc", Some(AssetClass::Crypto)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(ctl.request_count().await, 1);
    let stats = feed.stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));
    assert!((stats.hit_rate - 50.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn expired_quote_is_fetched_again() {
    let clock = Arc::new(ManualClock::new());
    let (p, ctl) = serving("cg", 1, 65_000).await;
    let feed = builder().with_provider(p).clock(clock.clone()).build().unwrap();

    feed.quote(BTC, AssetClass::Crypto).await.unwrap();
    clock.advance(Duration::from_secs(29));
    feed.quote(BTC, AssetClass::Crypto).await.unwrap();
    assert_eq!(ctl.request_count().await, 1);

    clock.advance(Duration::from_secs(2));
    feed.quote(BTC, AssetClass::Crypto).await.unwrap();
    assert_eq!(ctl.request_count().await, 2);
}

#[tokio::test]
async fn quote_and_batch_share_cache_entries() {
    let cache: Arc<TtlCache<MarketValue>> = TtlCache::new();
    let (p, ctl) = serving("eq", 20, 7).await;
    let feed = builder().with_provider(p).cache(cache.clone()).build().unwrap();

    feed.quote("AAPL", AssetClass::Equity).await.unwrap();
    let out = feed
        .fetch_many(&["AAPL", "MSFT"], Some(AssetClass::Equity))
        .await
        .unwrap();

    assert_eq!(out.cached_count, 1);
    assert_eq!(ctl.requested_symbols().await, vec!["AAPL".to_string(), "MSFT".to_string()]);
    assert!(cache.has("market:price:equity:MSFT"));
}
