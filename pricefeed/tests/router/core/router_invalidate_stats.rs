use pricefeed::{AssetClass, PricefeedError, keys};

use crate::helpers::{builder, serving};

#[tokio::test]
async fn invalidating_a_symbol_drops_all_its_entries() {
    let (p, ctl) = serving("cg", 1, 100).await;
    let feed = builder().with_provider(p).build().unwrap();

    feed.quote("BTC", AssetClass::Crypto).await.unwrap();
    feed.snapshot("BTC", AssetClass::Crypto).await.unwrap();
    feed.quote("ETH", AssetClass::Crypto).await.unwrap();
    assert_eq!(feed.cache().len(), 3);

    let removed = feed.invalidate(Some(" btc ")).unwrap();
    assert_eq!(removed, 2);
    assert!(!feed.cache().has(&keys::price_key(AssetClass::Crypto, "BTC")));
    assert!(feed.cache().has(&keys::price_key(AssetClass::Crypto, "ETH")));

    ctl.reset_log().await;
    feed.quote("BTC", AssetClass::Crypto).await.unwrap();
    assert_eq!(ctl.request_count().await, 1);
}

#[tokio::test]
async fn invalidating_everything_clears_the_namespace() {
    let (p, _ctl) = serving("cg", 1, 100).await;
    let feed = builder().with_provider(p).build().unwrap();

    feed.fetch_many(&["BTC", "ETH", "SOL"], Some(AssetClass::Crypto))
        .await
        .unwrap();
    assert_eq!(feed.invalidate(None).unwrap(), 3);
    assert!(feed.cache().is_empty());
    assert_eq!(feed.invalidate(None).unwrap(), 0);

    let err = feed.invalidate(Some("   ")).unwrap_err();
    assert!(matches!(err, PricefeedError::InvalidArg(_)));
}

#[tokio::test]
async fn stats_track_and_reset() {
    let (p, _ctl) = serving("cg", 1, 100).await;
    let feed = builder().with_provider(p).build().unwrap();

    feed.quote("BTC", AssetClass::Crypto).await.unwrap();
    feed.quote("BTC", AssetClass::Crypto).await.unwrap();
    feed.quote("BTC", AssetClass::Crypto).await.unwrap();

    let s = feed.stats();
    assert_eq!(s.hits, 2);
    assert_eq!(s.misses, 1);
    assert_eq!(s.sets, 1);
    assert_eq!(s.entries, 1);

    feed.reset_stats();
    let s = feed.stats();
    assert_eq!((s.hits, s.misses, s.sets), (0, 0, 0));
    assert_eq!(s.entries, 1);
    assert!(s.hit_rate.abs() < f64::EPSILON);
}
