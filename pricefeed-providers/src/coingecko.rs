use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricefeed_core::{
    AssetClass, AuxValue, BatchResults, HistoryPeriod, ListingEntry, PriceProvider, PricePoint,
    PriceRecord, PricefeedError, ProviderKey,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::transport::{HttpTransport, ReqwestTransport, build_url};
use crate::{decimal, decode};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER: &str = "coingecko";
const BATCH: usize = 50;

/// Ticker → (CoinGecko id, display name).
const COINS: &[(&str, &str, &str)] = &[
    ("BTC", "bitcoin", "Bitcoin"),
    ("ETH", "ethereum", "Ethereum"),
    ("SOL", "solana", "Solana"),
    ("XRP", "ripple", "XRP"),
    ("ADA", "cardano", "Cardano"),
    ("DOGE", "dogecoin", "Dogecoin"),
    ("DOT", "polkadot", "Polkadot"),
    ("AVAX", "avalanche-2", "Avalanche"),
    ("MATIC", "matic-network", "Polygon"),
    ("LINK", "chainlink", "Chainlink"),
    ("LTC", "litecoin", "Litecoin"),
    ("BCH", "bitcoin-cash", "Bitcoin Cash"),
    ("XLM", "stellar", "Stellar"),
    ("ATOM", "cosmos", "Cosmos Hub"),
    ("UNI", "uniswap", "Uniswap"),
    ("TRX", "tron", "TRON"),
    ("BNB", "binancecoin", "BNB"),
    ("USDT", "tether", "Tether"),
    ("USDC", "usd-coin", "USDC"),
    ("DAI", "dai", "Dai"),
    ("SHIB", "shiba-inu", "Shiba Inu"),
    ("NEAR", "near", "NEAR Protocol"),
    ("APT", "aptos", "Aptos"),
    ("ARB", "arbitrum", "Arbitrum"),
    ("OP", "optimism", "Optimism"),
    ("PEPE", "pepe", "Pepe"),
    ("TON", "the-open-network", "Toncoin"),
    ("PAXG", "pax-gold", "PAX Gold"),
];

/* ---------------- raw response types ---------------- */

/// One entry of `/simple/price`, keyed by coin id.
#[derive(Debug, Deserialize)]
struct RawSimplePrice {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
    usd_market_cap: Option<f64>,
    usd_24h_vol: Option<f64>,
    last_updated_at: Option<i64>,
}

/// `/coins/{id}/market_chart`: `[timestamp_ms, value]` pairs.
#[derive(Debug, Deserialize)]
struct RawMarketChart {
    prices: Vec<(i64, f64)>,
    #[serde(default)]
    total_volumes: Vec<(i64, f64)>,
}

/// CoinGecko crypto provider.
pub struct CoinGeckoProvider {
    transport: Arc<dyn HttpTransport>,
    base: String,
    api_key: Option<String>,
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CoinGeckoProvider {
    /// Static key for chain configuration.
    pub const KEY: ProviderKey = ProviderKey::new(PROVIDER);

    /// Public API over the default `reqwest` transport.
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
            api_key: None,
        }
    }

    /// Point at another base URL (pro endpoint, proxy or local test server).
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// Send a demo/pro API key with every request.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// CoinGecko id for a ticker.
    #[must_use]
    pub fn coin_id(symbol: &str) -> Option<&'static str> {
        COINS
            .iter()
            .find(|(t, _, _)| *t == symbol)
            .map(|(_, id, _)| *id)
    }

    fn display_name(symbol: &str) -> Option<&'static str> {
        COINS
            .iter()
            .find(|(t, _, _)| *t == symbol)
            .map(|(_, _, name)| *name)
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        self.api_key
            .iter()
            .map(|k| ("x-cg-demo-api-key", k.clone()))
            .collect()
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<serde_json::Value, PricefeedError> {
        let url = build_url(PROVIDER, &self.base, path, query)?;
        self.transport.get_json(PROVIDER, url, &self.headers()).await
    }

    fn normalize(symbol: &str, raw: &RawSimplePrice) -> Result<PriceRecord, PricefeedError> {
        let price = raw
            .usd
            .and_then(decimal)
            .ok_or_else(|| PricefeedError::Data(format!("{PROVIDER}: no usd price for {symbol}")))?;

        let mut record = PriceRecord::new(symbol, AssetClass::Crypto, price, PROVIDER)
            .with_display_name(Self::display_name(symbol).unwrap_or(symbol));

        if let Some(pct) = raw.usd_24h_change.and_then(decimal) {
            // price = prev * (1 + pct/100)  =>  abs = price * pct / (100 + pct)
            let denom = Decimal::ONE_HUNDRED + pct;
            let abs = if denom.is_zero() {
                Decimal::ZERO
            } else {
                (price * pct / denom).round_dp(8)
            };
            record = record.with_change(abs, pct.round_dp(4));
        }
        if let Some(ts) = raw.last_updated_at.and_then(|s| DateTime::<Utc>::from_timestamp(s, 0)) {
            record = record.with_observed_at(ts);
        }
        Ok(record
            .with_aux("market_cap", raw.usd_market_cap.and_then(decimal).map(AuxValue::from))
            .with_aux("volume_24h", raw.usd_24h_vol.and_then(decimal).map(AuxValue::from)))
    }

    const fn days_for(period: HistoryPeriod) -> &'static str {
        match period {
            HistoryPeriod::D1 => "1",
            HistoryPeriod::D5 => "5",
            HistoryPeriod::M1 => "30",
            HistoryPeriod::M3 => "90",
            HistoryPeriod::Y1 => "365",
            HistoryPeriod::Y5 => "1825",
        }
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn vendor(&self) -> &'static str {
        "CoinGecko"
    }

    fn supports_class(&self, class: AssetClass) -> bool {
        class == AssetClass::Crypto
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
        tracing::instrument(name = "coingecko::fetch_batch", skip(self), fields(n = symbols.len()))
    )]
    async fn fetch_batch(&self, symbols: &[String], class: AssetClass) -> BatchResults {
        let mut out = BatchResults::with_capacity(symbols.len());
        if class != AssetClass::Crypto {
            for s in symbols {
                out.insert(s.clone(), Err(PricefeedError::unsupported("coingecko/non-crypto")));
            }
            return out;
        }

        let mut ids: Vec<&'static str> = Vec::new();
        let mut wanted: Vec<(&String, &'static str)> = Vec::new();
        for s in symbols {
            match Self::coin_id(s) {
                Some(id) => {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                    wanted.push((s, id));
                }
                None => {
                    out.insert(s.clone(), Err(PricefeedError::not_found(format!("coingecko id for {s}"))));
                }
            }
        }
        if wanted.is_empty() {
            return out;
        }

        let joined = ids.join(",");
        let response = self
            .get(
                "/simple/price",
                &[
                    ("ids", joined.as_str()),
                    ("vs_currencies", "usd"),
                    ("include_24hr_change", "true"),
                    ("include_market_cap", "true"),
                    ("include_24hr_vol", "true"),
                    ("include_last_updated_at", "true"),
                ],
            )
            .await
            .and_then(|v| decode::<HashMap<String, RawSimplePrice>>(PROVIDER, v));

        match response {
            Ok(parsed) => {
                for (symbol, id) in wanted {
                    let r = parsed.get(id).map_or_else(
                        || Err(PricefeedError::not_found(format!("quote for {symbol}"))),
                        |raw| Self::normalize(symbol, raw),
                    );
                    out.insert(symbol.clone(), r);
                }
            }
            Err(e) => {
                for (symbol, _) in wanted {
                    out.insert(symbol.clone(), Err(e.clone()));
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
        if class != AssetClass::Crypto {
            return Err(PricefeedError::unsupported("coingecko/history/non-crypto"));
        }
        let id = Self::coin_id(symbol)
            .ok_or_else(|| PricefeedError::not_found(format!("coingecko id for {symbol}")))?;
        let path = format!("/coins/{id}/market_chart");
        let raw: RawMarketChart = decode(
            PROVIDER,
            self.get(&path, &[("vs_currency", "usd"), ("days", Self::days_for(period))])
                .await?,
        )?;

        let volumes: HashMap<i64, f64> = raw.total_volumes.into_iter().collect();
        let points: Vec<PricePoint> = raw
            .prices
            .into_iter()
            .filter_map(|(ms, px)| {
                Some(PricePoint {
                    ts: DateTime::<Utc>::from_timestamp_millis(ms)?,
                    close: decimal(px)?,
                    volume: volumes.get(&ms).copied().and_then(decimal),
                })
            })
            .collect();
        if points.is_empty() {
            return Err(PricefeedError::not_found(format!("history for {symbol}")));
        }
        Ok(points)
    }

    async fn fetch_directory(&self, class: AssetClass) -> Result<Vec<ListingEntry>, PricefeedError> {
        if class != AssetClass::Crypto {
            return Err(PricefeedError::unsupported("coingecko/directory/non-crypto"));
        }
        Ok(COINS
            .iter()
            .map(|(ticker, _, name)| ListingEntry {
                symbol: (*ticker).to_string(),
                display_name: (*name).to_string(),
                asset_class: AssetClass::Crypto,
            })
            .collect())
    }
}
