mod common;
use pricefeed::Pricefeed;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let feed = Pricefeed::builder()
        .with_provider(common::get_provider())
        .build()?;

    let symbols = ["AAPL", "MSFT", "BTC", "ETH", "EURUSD", "GC", "SPX", "NOTASYMBOL"];

    // Warm part of the cache so the second batch shows the partition.
    feed.fetch_many(&symbols[..3], None).await?;
    let outcome = feed.fetch_many(&symbols, None).await?;

    for r in &outcome.records {
        println!("{:<8} {:>12} {:>8}%  via {}", r.symbol(), r.price(), r.percent_change(), r.provenance());
    }
    println!(
        "cached={} fetched={} hit_rate={:.1}%",
        outcome.cached_count, outcome.fetched_count, outcome.cache_hit_rate
    );

    if !outcome.failed_symbols.is_empty() {
        eprintln!("Failures:");
        for s in &outcome.failed_symbols {
            if let Some(err) = outcome.failures.get(s) {
                eprintln!("- {s} -> {err}");
            }
        }
    }

    Ok(())
}
