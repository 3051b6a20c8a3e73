use pricefeed::{AssetClass, HistoryPeriod, ListingEntry, PricefeedError};
use pricefeed_mock::{DynamicMockProvider, MockBehavior};

use crate::helpers::{builder, point, serving};

#[tokio::test]
async fn history_is_cached_per_period() {
    let (p, ctl) = serving("y", 1, 1).await;
    ctl.set_history_behavior("SPX", MockBehavior::Return(vec![point(0, 5000), point(1, 5050)]))
        .await;
    let feed = builder().with_provider(p).build().unwrap();

    let a = feed
        .history("spx", AssetClass::Index, HistoryPeriod::D5)
        .await
        .unwrap();
    let b = feed
        .history("SPX", AssetClass::Index, HistoryPeriod::D5)
        .await
        .unwrap();
    assert_eq!(a.len(), 2);
    assert_eq!(a, b);
    assert_eq!(ctl.request_count().await, 1);

    feed.history("SPX", AssetClass::Index, HistoryPeriod::M1)
        .await
        .unwrap();
    assert_eq!(ctl.request_count().await, 2);
}

#[tokio::test]
async fn empty_history_falls_through_to_not_found() {
    let (p, ctl) = DynamicMockProvider::new_with_controller("y");
    ctl.set_history_behavior("GC", MockBehavior::Return(vec![])).await;
    let feed = builder().with_provider(p).build().unwrap();

    let err = feed
        .history("GC", AssetClass::Commodity, HistoryPeriod::D1)
        .await
        .unwrap_err();
    assert!(matches!(err, PricefeedError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn history_without_capable_provider_is_unsupported() {
    let (p, _ctl) = DynamicMockProvider::new_with_controller("y");
    let feed = builder().with_provider(p).build().unwrap();

    let err = feed
        .history("AAPL", AssetClass::Equity, HistoryPeriod::Y1)
        .await
        .unwrap_err();
    assert!(
        matches!(&err, PricefeedError::Unsupported { capability } if capability == "history"),
        "{err:?}"
    );
}

#[tokio::test]
async fn directory_and_snapshot_are_cached() {
    let (p, ctl) = serving("y", 1, 42).await;
    let listing = vec![ListingEntry {
        symbol: "BTC".into(),
        display_name: "Bitcoin".into(),
        asset_class: AssetClass::Crypto,
    }];
    ctl.set_directory_behavior(AssetClass::Crypto, MockBehavior::Return(listing.clone()))
        .await;
    let feed = builder().with_provider(p).build().unwrap();

    assert_eq!(feed.directory(AssetClass::Crypto).await.unwrap(), listing);
    assert_eq!(feed.directory(AssetClass::Crypto).await.unwrap(), listing);

    let snap = feed.snapshot("BTC", AssetClass::Crypto).await.unwrap();
    assert_eq!(snap.price(), rust_decimal::Decimal::from(42));
    feed.snapshot("BTC", AssetClass::Crypto).await.unwrap();

    assert_eq!(ctl.request_count().await, 2);
}
