use pricefeed::{AssetClass, PricefeedError, ProviderKey};
use pricefeed_mock::{DynamicMockProvider, MockBehavior};
use rust_decimal::Decimal;

use crate::helpers::{builder, serving};

#[tokio::test]
async fn secondary_answers_when_primary_fails() {
    let (primary, p_ctl) = serving("primary", 10, 1).await;
    p_ctl
        .set_quote_behavior("X", MockBehavior::Fail(PricefeedError::provider("primary", "503")))
        .await;
    let (secondary, s_ctl) = serving("secondary", 10, 2).await;

    let feed = builder()
        .with_provider(secondary)
        .with_provider(primary)
        .chain_for(
            AssetClass::Equity,
            &[ProviderKey::new("primary"), ProviderKey::new("secondary")],
        )
        .build()
        .unwrap();
    assert_eq!(feed.chain_names(AssetClass::Equity), vec!["primary", "secondary"]);

    let r = feed.quote("X", AssetClass::Equity).await.unwrap();
    assert_eq!(r.provenance(), "secondary");
    assert_eq!(r.price(), Decimal::from(2));
    assert_eq!(p_ctl.request_count().await, 1);
    assert_eq!(s_ctl.request_count().await, 1);
}

#[tokio::test]
async fn batch_fallback_only_forwards_failed_symbols() {
    let (primary, p_ctl) = serving("primary", 10, 1).await;
    p_ctl
        .set_quote_behavior("X", MockBehavior::Fail(PricefeedError::not_found("quote for X")))
        .await;
    let (secondary, s_ctl) = serving("secondary", 10, 2).await;

    let feed = builder()
        .with_provider(primary)
        .with_provider(secondary)
        .build()
        .unwrap();

    let out = feed
        .fetch_many(&["A", "X", "B"], Some(AssetClass::Equity))
        .await
        .unwrap();

    assert!(out.is_complete());
    assert_eq!(out.fetched_count, 3);
    assert_eq!(out.get("A").unwrap().provenance(), "primary");
    assert_eq!(out.get("X").unwrap().provenance(), "secondary");
    assert_eq!(s_ctl.request_log().await, vec![vec!["X".to_string()]]);
}

#[tokio::test]
async fn exhausted_chain_collapses_not_found() {
    let (a, _a_ctl) = DynamicMockProvider::new_with_controller("a");
    let (b, _b_ctl) = DynamicMockProvider::new_with_controller("b");
    let feed = builder().with_provider(a).with_provider(b).build().unwrap();

    let err = feed.quote("NOPE", AssetClass::Equity).await.unwrap_err();
    assert!(
        matches!(&err, PricefeedError::NotFound { what } if what.contains("NOPE")),
        "{err:?}"
    );
}

#[tokio::test]
async fn class_without_providers_is_unsupported() {
    let (eq, eq_ctl) = DynamicMockProvider::builder("eq")
        .classes([AssetClass::Equity])
        .build();
    eq_ctl.serve_any(Decimal::ONE).await;
    let feed = builder().with_provider(eq).build().unwrap();

    assert!(feed.chain_names(AssetClass::Forex).is_empty());
    let err = feed.quote("EURUSD", AssetClass::Forex).await.unwrap_err();
    assert!(matches!(err, PricefeedError::Unsupported { .. }), "{err:?}");
    assert_eq!(eq_ctl.request_count().await, 0);
}

#[tokio::test]
async fn mixed_failures_keep_every_provider_error() {
    let (a, a_ctl) = DynamicMockProvider::new_with_controller("a");
    a_ctl
        .set_quote_behavior("Q", MockBehavior::Fail(PricefeedError::provider("a", "boom")))
        .await;
    let (b, _b_ctl) = DynamicMockProvider::new_with_controller("b");
    let feed = builder().with_provider(a).with_provider(b).build().unwrap();

    match feed.quote("Q", AssetClass::Equity).await.unwrap_err() {
        PricefeedError::AllProvidersFailed(errs) => {
            assert_eq!(errs.len(), 2);
            assert!(matches!(&errs[0], PricefeedError::Provider { provider, .. } if provider == "a"));
            assert!(matches!(&errs[1], PricefeedError::NotFound { .. }));
        }
        other => panic!("unexpected: {other:?}"),
    }
}
