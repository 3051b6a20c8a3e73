mod common;
use pricefeed::{AssetClass, HistoryPeriod, Pricefeed};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let feed = Pricefeed::builder()
        .with_provider(common::get_provider())
        .build()?;

    let snap = feed.snapshot("SPX", AssetClass::Index).await?;
    println!("{} {}", snap.display_name(), snap.price());
    for (k, v) in snap.auxiliary() {
        println!("  {k}: {v:?}");
    }

    let series = feed.history("BTC", AssetClass::Crypto, HistoryPeriod::D5).await?;
    for p in &series {
        println!("{} close={}", p.ts.format("%Y-%m-%d"), p.close);
    }

    let listing = feed.directory(AssetClass::Crypto).await?;
    println!("{} crypto listings, first: {:?}", listing.len(), listing.first());

    println!("{:?}", feed.stats());
    Ok(())
}
