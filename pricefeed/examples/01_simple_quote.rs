mod common;
use pricefeed::{AssetClass, Pricefeed};
use common::get_provider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Create provider (mock in CI when PRICEFEED_EXAMPLES_USE_MOCK is set).
    let provider = get_provider();

    // 2. Build the façade and register the provider.
    let feed = Pricefeed::builder().with_provider(provider).build()?;

    // 3. Fetch with an explicit class.
    println!("Fetching quote for AAPL...");
    let quote = feed.quote("AAPL", AssetClass::Equity).await?;
    println!("{quote:#?}");

    // 4. Without a hint the class is guessed from the symbol.
    match feed.fetch_one("btc", None).await? {
        Some(q) => println!(
            "{} ({}): {} [{}%]",
            q.display_name(),
            q.asset_class(),
            q.price(),
            q.percent_change()
        ),
        None => println!("no provider could price BTC"),
    }

    Ok(())
}
