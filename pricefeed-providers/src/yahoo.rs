use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricefeed_core::{
    AssetClass, AuxValue, BatchResults, HistoryPeriod, PriceProvider, PricePoint, PriceRecord,
    PricefeedError, ProviderKey,
};
use serde::Deserialize;

use crate::transport::{HttpTransport, ReqwestTransport, build_url};
use crate::{decimal, decode};

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const PROVIDER: &str = "yahoo";
const BATCH: usize = 20;

const INDEX_ALIASES: &[(&str, &str)] = &[
    ("SPX", "^GSPC"),
    ("NDX", "^NDX"),
    ("DJI", "^DJI"),
    ("RUT", "^RUT"),
    ("VIX", "^VIX"),
    ("FTSE", "^FTSE"),
    ("DAX", "^GDAXI"),
    ("N225", "^N225"),
    ("HSI", "^HSI"),
    ("CAC", "^FCHI"),
    ("STOXX50E", "^STOXX50E"),
];

/* ---------------- raw response types ---------------- */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuoteEnvelope {
    quote_response: RawQuoteResponse,
}

#[derive(Debug, Deserialize)]
struct RawQuoteResponse {
    #[serde(default)]
    result: Vec<RawQuote>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuote {
    symbol: String,
    short_name: Option<String>,
    long_name: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_change: Option<f64>,
    regular_market_change_percent: Option<f64>,
    regular_market_previous_close: Option<f64>,
    regular_market_volume: Option<f64>,
    market_cap: Option<f64>,
    regular_market_time: Option<i64>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChartEnvelope {
    chart: RawChart,
}

#[derive(Debug, Deserialize)]
struct RawChart {
    result: Option<Vec<RawChartResult>>,
    error: Option<RawChartError>,
}

#[derive(Debug, Deserialize)]
struct RawChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: RawIndicators,
}

#[derive(Debug, Deserialize)]
struct RawIndicators {
    #[serde(default)]
    quote: Vec<RawChartQuote>,
}

#[derive(Debug, Deserialize)]
struct RawChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Yahoo Finance provider covering every asset class.
pub struct YahooProvider {
    transport: Arc<dyn HttpTransport>,
    base: String,
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooProvider {
    /// Static key for chain configuration.
    pub const KEY: ProviderKey = ProviderKey::new(PROVIDER);

    /// Public endpoints over the default `reqwest` transport.
    #[must_use]
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::shared())
    }

    /// Use a custom transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            base: BASE_URL.to_string(),
        }
    }

    /// Point at another base URL.
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// Yahoo ticker for a canonical symbol of a class.
    ///
    /// `BTC` → `BTC-USD`, `EURUSD` → `EURUSD=X`, `GC` → `GC=F`, `SPX` → `^GSPC`.
    #[must_use]
    pub fn yahoo_symbol(symbol: &str, class: AssetClass) -> String {
        match class {
            AssetClass::Equity => symbol.to_string(),
            AssetClass::Crypto if symbol.contains('-') => symbol.to_string(),
            AssetClass::Crypto => format!("{symbol}-USD"),
            AssetClass::Forex if symbol.ends_with("=X") => symbol.to_string(),
            AssetClass::Forex => format!("{symbol}=X"),
            AssetClass::Commodity if symbol.ends_with("=F") => symbol.to_string(),
            AssetClass::Commodity => format!("{symbol}=F"),
            AssetClass::Index if symbol.starts_with('^') => symbol.to_string(),
            AssetClass::Index => INDEX_ALIASES
                .iter()
                .find(|(s, _)| *s == symbol)
                .map_or_else(|| format!("^{symbol}"), |(_, y)| (*y).to_string()),
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<serde_json::Value, PricefeedError> {
        let url = build_url(PROVIDER, &self.base, path, query)?;
        self.transport.get_json(PROVIDER, url, &[]).await
    }

    fn normalize(symbol: &str, class: AssetClass, raw: &RawQuote) -> Result<PriceRecord, PricefeedError> {
        let price = raw
            .regular_market_price
            .and_then(decimal)
            .ok_or_else(|| PricefeedError::Data(format!("{PROVIDER}: no price for {symbol}")))?;

        let name = raw
            .short_name
            .as_deref()
            .or(raw.long_name.as_deref())
            .unwrap_or(symbol);
        let mut record = PriceRecord::new(symbol, class, price, PROVIDER).with_display_name(name);

        record = match (
            raw.regular_market_change.and_then(decimal),
            raw.regular_market_change_percent.and_then(decimal),
            raw.regular_market_previous_close.and_then(decimal),
        ) {
            (Some(abs), Some(pct), _) => record.with_change(abs, pct.round_dp(4)),
            (_, _, Some(pc)) => record.with_previous_close(pc),
            _ => record,
        };
        if let Some(ts) = raw.regular_market_time.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)) {
            record = record.with_observed_at(ts);
        }
        Ok(record
            .with_aux("volume", raw.regular_market_volume.and_then(decimal).map(AuxValue::from))
            .with_aux("market_cap", raw.market_cap.and_then(decimal).map(AuxValue::from))
            .with_aux("currency", raw.currency.clone().map(AuxValue::from)))
    }

    const fn interval_for(period: HistoryPeriod) -> &'static str {
        match period {
            HistoryPeriod::D1 => "5m",
            HistoryPeriod::D5 => "30m",
            HistoryPeriod::M1 | HistoryPeriod::M3 | HistoryPeriod::Y1 => "1d",
            HistoryPeriod::Y5 => "1wk",
        }
    }
}

#[async_trait]
impl PriceProvider for YahooProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn vendor(&self) -> &'static str {
        "Yahoo Finance"
    }

    fn supports_class(&self, _class: AssetClass) -> bool {
        true
    }

    fn batch_size(&self) -> usize {
        BATCH
    }

    async fn fetch(&self, symbol: &str, class: AssetClass) -> Result<PriceRecord, PricefeedError> {
        let symbols = [symbol.to_string()];
        self.fetch_batch(&symbols, class)
            .await
            .remove(symbol)
            .unwrap_or_else(|| Err(PricefeedError::not_found(format!("quote for {symbol}"))))
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "yahoo::fetch_batch", skip(self), fields(n = symbols.len()))
    )]
    async fn fetch_batch(&self, symbols: &[String], class: AssetClass) -> BatchResults {
        let tickers: Vec<String> = symbols.iter().map(|s| Self::yahoo_symbol(s, class)).collect();
        // Yahoo ticker → requested symbol
        let mapping: HashMap<&str, &String> = tickers.iter().map(String::as_str).zip(symbols).collect();
        let joined = tickers.join(",");

        let response = self
            .get("/v7/finance/quote", &[("symbols", joined.as_str())])
            .await
            .and_then(|v| decode::<RawQuoteEnvelope>(PROVIDER, v))
            .and_then(|env| match env.quote_response.error {
                Some(e) if !e.is_null() => Err(PricefeedError::provider(PROVIDER, e.to_string())),
                _ => Ok(env.quote_response.result),
            });

        let mut out = BatchResults::with_capacity(symbols.len());
        match response {
            Ok(quotes) => {
                for raw in &quotes {
                    if let Some(requested) = mapping.get(raw.symbol.to_ascii_uppercase().as_str()) {
                        out.insert((*requested).clone(), Self::normalize(requested, class, raw));
                    }
                }
                for s in symbols {
                    out.entry(s.clone())
                        .or_insert_with(|| Err(PricefeedError::not_found(format!("quote for {s}"))));
                }
            }
            Err(e) => {
                for s in symbols {
                    out.insert(s.clone(), Err(e.clone()));
                }
            }
        }
        out
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        class: AssetClass,
        period: HistoryPeriod,
    ) -> Result<Vec<PricePoint>, PricefeedError> {
        let path = format!("/v8/finance/chart/{}", Self::yahoo_symbol(symbol, class));
        let env: RawChartEnvelope = decode(
            PROVIDER,
            self.get(
                &path,
                &[("range", period.as_str()), ("interval", Self::interval_for(period))],
            )
            .await?,
        )?;

        if let Some(err) = env.chart.error {
            let code = err.code.unwrap_or_default();
            if code.eq_ignore_ascii_case("not found") {
                return Err(PricefeedError::not_found(format!("history for {symbol}")));
            }
            return Err(PricefeedError::provider(
                PROVIDER,
                err.description.unwrap_or(code),
            ));
        }
        let result = env
            .chart
            .result
            .and_then(|mut r| (!r.is_empty()).then(|| r.swap_remove(0)))
            .ok_or_else(|| PricefeedError::not_found(format!("history for {symbol}")))?;
        let quote = result.indicators.quote.into_iter().next().ok_or_else(|| {
            PricefeedError::Data(format!("{PROVIDER}: chart without quote indicators"))
        })?;

        let points: Vec<PricePoint> = result
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                let close = quote.close.get(i).copied().flatten().and_then(decimal)?;
                Some(PricePoint {
                    ts: DateTime::<Utc>::from_timestamp(*ts, 0)?,
                    close,
                    volume: quote.volume.get(i).copied().flatten().and_then(decimal),
                })
            })
            .collect();
        if points.is_empty() {
            return Err(PricefeedError::not_found(format!("history for {symbol}")));
        }
        Ok(points)
    }
}
