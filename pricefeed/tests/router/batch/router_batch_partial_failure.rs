use std::time::Duration;

use pricefeed::{AssetClass, PricefeedError};
use pricefeed_mock::MockBehavior;

use crate::helpers::{builder, rec, serving};

#[tokio::test]
async fn one_bad_symbol_does_not_sink_the_batch() {
    let (p, ctl) = serving("eq", 50, 10).await;
    ctl.set_quote_behavior(
        "BAD",
        MockBehavior::Fail(PricefeedError::provider("eq", "upstream exploded")),
    )
    .await;
    let feed = builder().with_provider(p).build().unwrap();

    let out = feed
        .fetch_many(&["A", "B", "BAD", "C", "D"], Some(AssetClass::Equity))
        .await
        .unwrap();

    assert_eq!(out.records.len(), 4);
    assert_eq!(out.failed_symbols, vec!["BAD".to_string()]);
    assert!(out.get("BAD").is_none());
    match out.failures.get("BAD") {
        Some(PricefeedError::AllProvidersFailed(errs)) => {
            assert_eq!(errs.len(), 1);
            assert!(matches!(&errs[0], PricefeedError::Provider { provider, .. } if provider == "eq"));
        }
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[tokio::test]
async fn failures_are_not_cached() {
    let (p, ctl) = serving("eq", 50, 10).await;
    ctl.set_quote_behavior("BAD", MockBehavior::Fail(PricefeedError::provider("eq", "flaky")))
        .await;
    let feed = builder().with_provider(p).build().unwrap();

    let first = feed.fetch_many(&["BAD"], Some(AssetClass::Equity)).await.unwrap();
    assert_eq!(first.failed_symbols, vec!["BAD".to_string()]);
    assert_eq!(ctl.times_requested("BAD").await, 1);

    // Overwrite the rule in place; clearing behaviors would also drop the request log.
    ctl.set_quote_behavior("BAD", MockBehavior::Return(rec("BAD", AssetClass::Equity, 3, "eq")))
        .await;

    let out = feed.fetch_many(&["BAD"], Some(AssetClass::Equity)).await.unwrap();
    assert_eq!(out.fetched_count, 1);
    assert!(out.is_complete());
    assert_eq!(ctl.times_requested("BAD").await, 2);
}

#[tokio::test(start_paused = true)]
async fn slow_symbol_times_out_alone() {
    let (p, ctl) = serving("eq", 1, 10).await;
    ctl.set_quote_behavior("SLOW", MockBehavior::Hang).await;
    let feed = builder()
        .with_provider(p)
        .provider_timeout(Duration::from_secs(1))
        .build()
        .unwrap();

    let out = feed
        .fetch_many(&["A", "SLOW", "B", "C"], Some(AssetClass::Equity))
        .await
        .unwrap();

    assert_eq!(out.records.len(), 3);
    assert_eq!(out.failed_symbols, vec!["SLOW".to_string()]);
    assert!(matches!(
        out.failures.get("SLOW"),
        Some(PricefeedError::AllProvidersTimedOut { capability }) if capability == "quote"
    ));
}
