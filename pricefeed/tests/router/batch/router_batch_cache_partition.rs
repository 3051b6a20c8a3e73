use pricefeed::{AssetClass, PricefeedError};
use pricefeed_mock::MockBehavior;

use crate::helpers::{AAPL, builder, rec, serving, syms};

#[tokio::test]
async fn only_uncached_symbols_reach_the_provider() {
    let (p, ctl) = serving("eq", 50, 100).await;
    let feed = builder().with_provider(p).build().unwrap();

    let all = syms("S", 10);
    let warm = &all[..6];
    feed.fetch_many(warm, Some(AssetClass::Equity)).await.unwrap();
    ctl.reset_log().await;

    let out = feed.fetch_many(&all, Some(AssetClass::Equity)).await.unwrap();

    assert_eq!(out.records.len(), 10);
    assert_eq!(out.cached_count, 6);
    assert_eq!(out.fetched_count, 4);
    assert!(out.failed_symbols.is_empty());
    assert!((out.cache_hit_rate - 60.0).abs() < f64::EPSILON);

    let log = ctl.request_log().await;
    assert_eq!(log.len(), 1, "uncached symbols share one request: {log:?}");
    assert_eq!(log[0], all[6..].to_vec());

    let order: Vec<&str> = out.records.iter().map(|r| r.symbol()).collect();
    assert_eq!(order, all.iter().map(String::as_str).collect::<Vec<_>>());
}

#[tokio::test]
async fn fully_cached_batch_makes_no_provider_call() {
    let (p, ctl) = serving("eq", 50, 100).await;
    let feed = builder().with_provider(p).build().unwrap();
    let symbols = ["AAPL", "MSFT", "NVDA"];

    feed.fetch_many(&symbols, Some(AssetClass::Equity)).await.unwrap();
    ctl.reset_log().await;

    let out = feed.fetch_many(&symbols, Some(AssetClass::Equity)).await.unwrap();
    assert_eq!(out.cached_count, 3);
    assert_eq!(out.fetched_count, 0);
    assert!((out.cache_hit_rate - 100.0).abs() < f64::EPSILON);
    assert_eq!(ctl.request_count().await, 0);
}

#[tokio::test]
async fn batch_of_one_matches_single_lookup() {
    let fixed = rec(AAPL, AssetClass::Equity, 190, "eq");

    let (p1, ctl1) = serving("eq", 50, 1).await;
    ctl1.set_quote_behavior(AAPL, MockBehavior::Return(fixed.clone())).await;
    let single = builder().with_provider(p1).build().unwrap();

    let (p2, ctl2) = serving("eq", 50, 1).await;
    ctl2.set_quote_behavior(AAPL, MockBehavior::Return(fixed.clone())).await;
    let batched = builder().with_provider(p2).build().unwrap();

    let one = single
        .fetch_one("aapl", Some(AssetClass::Equity))
        .await
        .unwrap()
        .unwrap();
    let many = batched
        .fetch_many(&["aapl"], Some(AssetClass::Equity))
        .await
        .unwrap();

    assert_eq!(many.records, vec![one.clone()]);
    assert_eq!(one, fixed);
    assert_eq!(single.stats().misses, batched.stats().misses);
    assert_eq!(ctl1.request_count().await, ctl2.request_count().await);
}

#[tokio::test]
async fn duplicates_collapse_and_empty_lists_are_rejected() {
    let (p, ctl) = serving("eq", 50, 5).await;
    let feed = builder().with_provider(p).build().unwrap();

    let out = feed
        .fetch_many(&["msft", " MSFT ", "Msft"], Some(AssetClass::Equity))
        .await
        .unwrap();
    assert_eq!(out.records.len(), 1);
    assert_eq!(ctl.times_requested("MSFT").await, 1);

    let err = feed.fetch_many::<&str>(&[], None).await.unwrap_err();
    assert!(matches!(err, PricefeedError::InvalidArg(_)), "{err:?}");
}
