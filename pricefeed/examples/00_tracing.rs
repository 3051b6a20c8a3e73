mod common;
use pricefeed::{AssetClass, HistoryPeriod, Pricefeed};
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=info,pricefeed=trace,pricefeed_providers=debug
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .try_init();

    let feed = Pricefeed::builder()
        .with_provider(common::get_provider())
        .build()?;

    // Miss, then hit.
    let _ = feed.quote("AAPL", AssetClass::Equity).await?;
    let _ = feed.quote("AAPL", AssetClass::Equity).await?;

    let _ = feed.history("AAPL", AssetClass::Equity, HistoryPeriod::D5).await?;
    let _ = feed.fetch_many(&["BTC", "ETH", "NOPE"], None).await?;

    feed.shutdown().await;
    Ok(())
}
