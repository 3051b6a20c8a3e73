use pricefeed::{AssetClass, PricefeedError};
use pricefeed_mock::{DynamicMockProvider, MockBehavior};
use rust_decimal::Decimal;

use crate::helpers::{AAPL, ETH, builder, rec};

#[tokio::test]
async fn unknown_symbol_is_retried_under_next_class() {
    let (eq, eq_ctl) = DynamicMockProvider::builder("eq")
        .batch_size(20)
        .classes([AssetClass::Equity])
        .build();
    eq_ctl
        .set_quote_behavior(AAPL, MockBehavior::Return(rec(AAPL, AssetClass::Equity, 190, "eq")))
        .await;
    let (cg, cg_ctl) = DynamicMockProvider::builder("cg")
        .batch_size(20)
        .classes([AssetClass::Crypto])
        .build();
    cg_ctl.serve_any(Decimal::from(2)).await;

    let feed = builder().with_provider(eq).with_provider(cg).build().unwrap();
    let out = feed.fetch_many(&["AAPL", "FOO"], None).await.unwrap();

    assert!(out.is_complete(), "{:?}", out.failures);
    assert_eq!(out.get("AAPL").unwrap().provenance(), "eq");
    let foo = out.get("FOO").unwrap();
    assert_eq!(foo.provenance(), "cg");
    assert_eq!(foo.asset_class(), AssetClass::Crypto);
    assert_eq!(eq_ctl.request_log().await, vec![vec!["AAPL".to_string(), "FOO".to_string()]]);
    assert_eq!(cg_ctl.requested_symbols().await, vec!["FOO".to_string()]);
}

#[tokio::test]
async fn unpriceable_symbol_reports_not_found() {
    let (eq, _eq_ctl) = DynamicMockProvider::builder("eq")
        .batch_size(20)
        .classes([AssetClass::Equity])
        .build();
    let (cg, _cg_ctl) = DynamicMockProvider::builder("cg")
        .batch_size(20)
        .classes([AssetClass::Crypto])
        .build();
    let feed = builder().with_provider(eq).with_provider(cg).build().unwrap();

    let out = feed.fetch_many(&["ZZZZ"], None).await.unwrap();
    assert!(out.records.is_empty());
    assert_eq!(out.failed_symbols, vec!["ZZZZ".to_string()]);
    assert!(
        matches!(out.failures.get("ZZZZ"), Some(PricefeedError::NotFound { .. })),
        "{:?}",
        out.failures
    );

    assert_eq!(feed.fetch_one("ZZZZ", None).await.unwrap(), None);
}

#[tokio::test]
async fn single_lookup_starts_with_the_guessed_class() {
    let (eq, eq_ctl) = DynamicMockProvider::builder("eq")
        .classes([AssetClass::Equity])
        .build();
    eq_ctl.serve_any(Decimal::from(1)).await;
    let (cg, cg_ctl) = DynamicMockProvider::builder("cg")
        .classes([AssetClass::Crypto])
        .build();
    cg_ctl.serve_any(Decimal::from(3000)).await;

    let feed = builder().with_provider(eq).with_provider(cg).build().unwrap();
    let r = feed.fetch_one(ETH, None).await.unwrap().unwrap();

    assert_eq!(r.provenance(), "cg");
    assert_eq!(r.price(), Decimal::from(3000));
    assert_eq!(eq_ctl.request_count().await, 0);
    assert_eq!(cg_ctl.request_count().await, 1);
}

#[tokio::test]
async fn fallback_resolved_symbol_is_served_from_cache() {
    let (eq, eq_ctl) = DynamicMockProvider::builder("eq")
        .batch_size(20)
        .classes([AssetClass::Equity])
        .build();
    let (cg, cg_ctl) = DynamicMockProvider::builder("cg")
        .batch_size(20)
        .classes([AssetClass::Crypto])
        .build();
    cg_ctl.serve_any(Decimal::from(2)).await;
    let feed = builder().with_provider(eq).with_provider(cg).build().unwrap();

    let first = feed.fetch_many(&["FOO"], None).await.unwrap();
    assert_eq!(first.fetched_count, 1);
    assert_eq!(eq_ctl.request_count().await, 1);
    assert_eq!(cg_ctl.request_count().await, 1);

    let again = feed.fetch_many(&["FOO"], None).await.unwrap();
    assert_eq!((again.cached_count, again.fetched_count), (1, 0));
    assert!((again.cache_hit_rate - 100.0).abs() < f64::EPSILON);
    assert_eq!(again.get("FOO").unwrap().asset_class(), AssetClass::Crypto);

    let one = feed.fetch_one("foo", None).await.unwrap().unwrap();
    assert_eq!(one.provenance(), "cg");

    assert_eq!(eq_ctl.request_count().await, 1, "guessed class was queried again");
    assert_eq!(cg_ctl.request_count().await, 1);
}
