use std::sync::Arc;
use std::time::Duration;

use pricefeed::{AssetClass, Pricefeed, PricefeedConfig};
use pricefeed_providers::{CoinGeckoProvider, FinnhubProvider, YahooProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Pricefeed::builder()
        .with_provider(Arc::new(CoinGeckoProvider::new()))
        .with_provider(Arc::new(YahooProvider::new()));

    // Finnhub is optional: only chained when FINNHUB_API_KEY is set.
    let equity_chain = match FinnhubProvider::from_env() {
        Ok(finnhub) => {
            builder = builder.with_provider(Arc::new(finnhub));
            vec![FinnhubProvider::KEY, YahooProvider::KEY]
        }
        Err(e) => {
            println!("skipping finnhub: {e}");
            vec![YahooProvider::KEY]
        }
    };

    let cfg = PricefeedConfig::from_json_str(r#"{ "max_in_flight": 6, "chunk_sizes": { "yahoo": 20 } }"#)?;
    let feed = builder
        .config(cfg)
        .provider_timeout(Duration::from_secs(5))
        .chain_for(AssetClass::Crypto, &[CoinGeckoProvider::KEY, YahooProvider::KEY])
        .chain_for(AssetClass::Equity, &equity_chain)
        .build()?;

    for class in AssetClass::ALL {
        println!("{class}: {:?}", feed.chain_names(class));
    }

    let outcome = feed
        .fetch_many(&["BTC", "ETH", "AAPL", "NVDA", "EURUSD"], None)
        .await?;
    for r in &outcome.records {
        println!("{} {} via {}", r.symbol(), r.price(), r.provenance());
    }
    for s in &outcome.failed_symbols {
        println!("failed: {s}");
    }

    feed.shutdown().await;
    Ok(())
}
