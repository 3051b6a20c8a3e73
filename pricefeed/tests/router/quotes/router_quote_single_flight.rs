use std::sync::Arc;
use std::time::Duration;

use pricefeed::AssetClass;

use crate::helpers::{BTC, builder, serving};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_misses_share_one_fetch() {
    let (p, ctl) = serving("cg", 1, 65_000).await;
    ctl.set_latency(Duration::from_millis(50)).await;
    let feed = Arc::new(builder().with_provider(p).build().unwrap());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let feed = Arc::clone(&feed);
            tokio::spawn(async move { feed.fetch_one(BTC, Some(AssetClass::Crypto)).await })
        })
        .collect();
    for t in futures::future::join_all(tasks).await {
        assert!(t.unwrap().unwrap().is_some());
    }

    assert_eq!(ctl.request_count().await, 1);
}

#[tokio::test]
async fn overlapping_batches_fetch_shared_symbol_once() {
    let (p, ctl) = serving("eq", 10, 3).await;
    ctl.set_latency(Duration::from_millis(50)).await;
    let feed = builder().with_provider(p).build().unwrap();

    let (a, b) = tokio::join!(
        feed.fetch_many(&["X", "Y"], Some(AssetClass::Equity)),
        feed.fetch_many(&["Y", "Z"], Some(AssetClass::Equity)),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(a.is_complete() && b.is_complete());
    assert_eq!(ctl.times_requested("Y").await, 1);
    assert_eq!(a.get("Y"), b.get("Y"));
}
