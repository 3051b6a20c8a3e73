use pricefeed::{AssetClass, Pricefeed, PricefeedConfig, PricefeedError, ProviderKey};
use pricefeed_mock::DynamicMockProvider;

use crate::helpers::builder;

fn is_config(r: Result<Pricefeed, PricefeedError>) -> bool {
    matches!(r, Err(PricefeedError::Config(_)))
}

#[test]
fn build_requires_a_provider() {
    assert!(is_config(Pricefeed::builder().build()));
}

#[test]
fn chain_must_name_registered_providers() {
    let (p, _) = DynamicMockProvider::new_with_controller("a");
    let r = builder()
        .with_provider(p)
        .chain_for(AssetClass::Equity, &[ProviderKey::new("ghost")])
        .build();
    assert!(is_config(r));
}

#[test]
fn chained_provider_must_support_the_class() {
    let (p, _) = DynamicMockProvider::builder("cg")
        .classes([AssetClass::Crypto])
        .build();
    let r = builder()
        .with_provider(p)
        .chain_for(AssetClass::Equity, &[ProviderKey::new("cg")])
        .build();
    assert!(is_config(r));
}

#[test]
fn rejects_bad_limits_and_duplicates() {
    let (p, _) = DynamicMockProvider::new_with_controller("a");
    assert!(is_config(builder().with_provider(p).max_in_flight(0).build()));

    let (p, _) = DynamicMockProvider::new_with_controller("a");
    let r = builder()
        .with_provider(p)
        .chunk_size(ProviderKey::new("ghost"), 10)
        .build();
    assert!(is_config(r));

    let (p1, _) = DynamicMockProvider::new_with_controller("a");
    let (p2, _) = DynamicMockProvider::new_with_controller("a");
    assert!(is_config(builder().with_provider(p1).with_provider(p2).build()));
}

#[test]
fn default_chain_follows_registration_order() {
    let (a, _) = DynamicMockProvider::builder("a")
        .classes([AssetClass::Equity, AssetClass::Crypto])
        .build();
    let (b, _) = DynamicMockProvider::builder("b")
        .classes([AssetClass::Crypto])
        .build();
    let feed = builder()
        .with_provider(b)
        .with_provider(a)
        .chain_for(AssetClass::Equity, &[ProviderKey::new("a"), ProviderKey::new("a")])
        .build()
        .unwrap();

    assert_eq!(feed.chain_names(AssetClass::Crypto), vec!["b", "a"]);
    assert_eq!(feed.chain_names(AssetClass::Equity), vec!["a"]);
    assert!(feed.chain_names(AssetClass::Index).is_empty());
}

#[tokio::test]
async fn json_config_drives_chains_and_chunking() {
    let cfg = PricefeedConfig::from_json_str(
        r#"{
            "provider_timeout": { "secs": 2, "nanos": 0 },
            "chains": { "crypto": ["cg"] },
            "chunk_sizes": { "cg": 2 }
        }"#,
    )
    .unwrap();

    let (eq, _) = DynamicMockProvider::new_with_controller("eq");
    let (cg, cg_ctl) = DynamicMockProvider::builder("cg")
        .batch_size(250)
        .classes([AssetClass::Crypto])
        .build();
    cg_ctl.serve_any(rust_decimal::Decimal::TEN).await;
    let feed = Pricefeed::builder()
        .with_provider(eq)
        .with_provider(cg)
        .config(cfg)
        .build()
        .unwrap();

    assert_eq!(feed.chain_names(AssetClass::Crypto), vec!["cg"]);
    assert_eq!(feed.config().provider_timeout, std::time::Duration::from_secs(2));

    let out = feed
        .fetch_many(&["BTC", "ETH", "SOL"], Some(AssetClass::Crypto))
        .await
        .unwrap();
    assert!(out.is_complete());
    let sizes: Vec<usize> = cg_ctl.request_log().await.iter().map(Vec::len).collect();
    assert_eq!(sizes.iter().sum::<usize>(), 3);
    assert!(sizes.iter().all(|n| *n <= 2), "{sizes:?}");
}
