use pricefeed_core::{AssetClass, AuxValue, PriceRecord};
use rust_decimal::Decimal;

use super::PROVIDER;

struct Row {
    symbol: &'static str,
    name: &'static str,
    class: AssetClass,
    // Prices are in cents (or 1/10_000 for forex) to stay exact.
    price: i64,
    previous_close: i64,
    scale: u32,
    volume: i64,
}

const ROWS: &[Row] = &[
    Row { symbol: "AAPL", name: "Apple Inc.", class: AssetClass::Equity, price: 19_000, previous_close: 18_800, scale: 2, volume: 52_000_000 },
    Row { symbol: "MSFT", name: "Microsoft Corp", class: AssetClass::Equity, price: 42_000, previous_close: 41_800, scale: 2, volume: 21_000_000 },
    Row { symbol: "GOOGL", name: "Alphabet Inc. Class A", class: AssetClass::Equity, price: 15_000, previous_close: 14_800, scale: 2, volume: 25_000_000 },
    Row { symbol: "TSLA", name: "Tesla Inc.", class: AssetClass::Equity, price: 24_500, previous_close: 25_000, scale: 2, volume: 90_000_000 },
    Row { symbol: "BTC", name: "Bitcoin", class: AssetClass::Crypto, price: 6_500_000, previous_close: 6_400_000, scale: 2, volume: 31_000 },
    Row { symbol: "ETH", name: "Ethereum", class: AssetClass::Crypto, price: 350_000, previous_close: 355_000, scale: 2, volume: 420_000 },
    Row { symbol: "SOL", name: "Solana", class: AssetClass::Crypto, price: 15_000, previous_close: 14_500, scale: 2, volume: 2_600_000 },
    Row { symbol: "EURUSD", name: "EUR/USD", class: AssetClass::Forex, price: 10_850, previous_close: 10_830, scale: 4, volume: 0 },
    Row { symbol: "GC", name: "Gold Futures", class: AssetClass::Commodity, price: 235_000, previous_close: 233_000, scale: 2, volume: 180_000 },
    Row { symbol: "SPX", name: "S&P 500", class: AssetClass::Index, price: 520_000, previous_close: 518_000, scale: 2, volume: 0 },
];

fn record(row: &Row) -> PriceRecord {
    let price = Decimal::new(row.price, row.scale);
    PriceRecord::new(row.symbol, row.class, price, PROVIDER)
        .with_display_name(row.name)
        .with_previous_close(Decimal::new(row.previous_close, row.scale))
}

pub fn by_symbol(symbol: &str) -> Option<PriceRecord> {
    ROWS.iter().find(|r| r.symbol == symbol).map(record)
}

pub fn snapshot_by_symbol(symbol: &str) -> Option<PriceRecord> {
    let row = ROWS.iter().find(|r| r.symbol == symbol)?;
    let volume = (row.volume > 0).then(|| AuxValue::Number(Decimal::from(row.volume)));
    Some(
        record(row)
            .with_aux("previous_close", Some(Decimal::new(row.previous_close, row.scale).into()))
            .with_aux("volume", volume)
            .with_aux("market_cap", None),
    )
}

pub fn by_class(class: AssetClass) -> impl Iterator<Item = (&'static str, &'static str)> {
    ROWS.iter()
        .filter(move |r| r.class == class)
        .map(|r| (r.symbol, r.name))
}
