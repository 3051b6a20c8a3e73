use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricefeed_core::{
    AssetClass, AuxValue, HistoryPeriod, ListingEntry, PriceProvider, PricePoint, PriceRecord,
    PricefeedError, ProviderKey,
};
use serde::Deserialize;

use crate::transport::{HttpTransport, ReqwestTransport, build_url};
use crate::{decimal, decode};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER: &str = "finnhub";

/// Environment variable read by [`FinnhubProvider::from_env`].
pub const API_KEY_ENV: &str = "FINNHUB_API_KEY";

/* ---------------- raw response types ---------------- */

/// `/quote`
#[derive(Debug, Deserialize)]
struct RawQuote {
    /// Current price
    c: Option<f64>,
    /// Change
    d: Option<f64>,
    /// Percent change
    dp: Option<f64>,
    /// High of the day
    h: Option<f64>,
    /// Low of the day
    l: Option<f64>,
    /// Open of the day
    o: Option<f64>,
    /// Previous close
    pc: Option<f64>,
    /// Unix timestamp
    t: Option<i64>,
}

/// `/stock/candle`
#[derive(Debug, Deserialize)]
struct RawCandles {
    /// "ok" or "no_data"
    s: String,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
    #[serde(default)]
    t: Vec<i64>,
}

/// `/stock/symbol` entry
#[derive(Debug, Deserialize)]
struct RawListing {
    symbol: String,
    #[serde(default)]
    description: String,
}

/// Finnhub equity provider. Requires an API key.
pub struct FinnhubProvider {
    transport: Arc<dyn HttpTransport>,
    base: String,
    api_key: String,
}

impl std::fmt::Debug for FinnhubProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinnhubProvider")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl FinnhubProvider {
    /// Static key for chain configuration.
    pub const KEY: ProviderKey = ProviderKey::new(PROVIDER);

    /// Create a provider over the default `reqwest` transport.
    ///
    /// # Errors
    /// Returns `Config` if the key is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self, PricefeedError> {
        Self::with_transport(api_key, ReqwestTransport::shared())
    }

    /// Create a provider over a custom transport.
    ///
    /// # Errors
    /// Returns `Config` if the key is blank.
    pub fn with_transport(
        api_key: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, PricefeedError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(PricefeedError::config("finnhub API key is empty"));
        }
        Ok(Self {
            transport,
            base: BASE_URL.to_string(),
            api_key,
        })
    }

    /// Read the key from `FINNHUB_API_KEY`.
    ///
    /// # Errors
    /// Returns `Config` if the variable is unset or blank.
    pub fn from_env() -> Result<Self, PricefeedError> {
        Self::from_env_var(API_KEY_ENV)
    }

    /// Read the key from a named environment variable.
    ///
    /// # Errors
    /// Returns `Config` if the variable is unset or blank.
    pub fn from_env_var(var: &str) -> Result<Self, PricefeedError> {
        let key = std::env::var(var)
            .map_err(|_| PricefeedError::config(format!("{var} is not set")))?;
        Self::new(key)
    }

    /// Point at another base URL.
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<serde_json::Value, PricefeedError> {
        let url = build_url(PROVIDER, &self.base, path, query)?;
        let headers = [("X-Finnhub-Token", self.api_key.clone())];
        self.transport.get_json(PROVIDER, url, &headers).await
    }

    async fn quote(&self, symbol: &str) -> Result<RawQuote, PricefeedError> {
        decode(PROVIDER, self.get("/quote", &[("symbol", symbol)]).await?)
    }

    fn normalize(symbol: &str, raw: &RawQuote) -> Result<PriceRecord, PricefeedError> {
        let price = raw
            .c
            .and_then(decimal)
            .ok_or_else(|| PricefeedError::Data(format!("{PROVIDER}: no price for {symbol}")))?;
        // Unknown symbols come back as an all-zero quote.
        if price.is_zero() && raw.pc.is_none_or(|pc| pc == 0.0) {
            return Err(PricefeedError::not_found(format!("quote for {symbol}")));
        }

        let mut record = PriceRecord::new(symbol, AssetClass::Equity, price, PROVIDER);
        record = match (raw.d.and_then(decimal), raw.dp.and_then(decimal), raw.pc.and_then(decimal)) {
            (Some(d), Some(dp), _) => record.with_change(d, dp),
            (_, _, Some(pc)) => record.with_previous_close(pc),
            _ => record,
        };
        if let Some(ts) = raw.t.filter(|t| *t > 0).and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)) {
            record = record.with_observed_at(ts);
        }
        Ok(record)
    }

    const fn days_for(period: HistoryPeriod) -> (i64, &'static str) {
        match period {
            HistoryPeriod::D1 => (1, "5"),
            HistoryPeriod::D5 => (5, "60"),
            HistoryPeriod::M1 => (30, "D"),
            HistoryPeriod::M3 => (90, "D"),
            HistoryPeriod::Y1 => (365, "D"),
            HistoryPeriod::Y5 => (5 * 365, "W"),
        }
    }
}

#[async_trait]
impl PriceProvider for FinnhubProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn vendor(&self) -> &'static str {
        "Finnhub"
    }

    fn supports_class(&self, class: AssetClass) -> bool {
        class == AssetClass::Equity
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(name = "finnhub::fetch", skip(self)))]
    async fn fetch(&self, symbol: &str, class: AssetClass) -> Result<PriceRecord, PricefeedError> {
        if class != AssetClass::Equity {
            return Err(PricefeedError::unsupported("finnhub/non-equity"));
        }
        let raw = self.quote(symbol).await?;
        Self::normalize(symbol, &raw)
    }

    async fn fetch_snapshot(
        &self,
        symbol: &str,
        class: AssetClass,
    ) -> Result<PriceRecord, PricefeedError> {
        if class != AssetClass::Equity {
            return Err(PricefeedError::unsupported("finnhub/non-equity"));
        }
        let raw = self.quote(symbol).await?;
        let aux = |v: Option<f64>| v.and_then(decimal).map(AuxValue::from);
        Ok(Self::normalize(symbol, &raw)?
            .with_aux("open", aux(raw.o))
            .with_aux("high", aux(raw.h))
            .with_aux("low", aux(raw.l))
            .with_aux("previous_close", aux(raw.pc)))
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        class: AssetClass,
        period: HistoryPeriod,
    ) -> Result<Vec<PricePoint>, PricefeedError> {
        if class != AssetClass::Equity {
            return Err(PricefeedError::unsupported("finnhub/history/non-equity"));
        }
        let (days, resolution) = Self::days_for(period);
        let to = Utc::now().timestamp();
        let from = (to - days * 86_400).to_string();
        let to = to.to_string();
        let raw: RawCandles = decode(
            PROVIDER,
            self.get(
                "/stock/candle",
                &[
                    ("symbol", symbol),
                    ("resolution", resolution),
                    ("from", from.as_str()),
                    ("to", to.as_str()),
                ],
            )
            .await?,
        )?;
        if raw.s != "ok" || raw.c.is_empty() {
            return Err(PricefeedError::not_found(format!("history for {symbol}")));
        }
        if raw.c.len() != raw.t.len() {
            return Err(PricefeedError::Data(format!(
                "{PROVIDER}: candle arrays differ in length for {symbol}"
            )));
        }

        Ok(raw
            .t
            .iter()
            .zip(&raw.c)
            .enumerate()
            .filter_map(|(i, (ts, close))| {
                Some(PricePoint {
                    ts: DateTime::<Utc>::from_timestamp(*ts, 0)?,
                    close: decimal(*close)?,
                    volume: raw.v.get(i).copied().and_then(decimal),
                })
            })
            .collect())
    }

    async fn fetch_directory(&self, class: AssetClass) -> Result<Vec<ListingEntry>, PricefeedError> {
        if class != AssetClass::Equity {
            return Err(PricefeedError::unsupported("finnhub/directory/non-equity"));
        }
        let raw: Vec<RawListing> =
            decode(PROVIDER, self.get("/stock/symbol", &[("exchange", "US")]).await?)?;
        Ok(raw
            .into_iter()
            .filter(|r| !r.symbol.is_empty())
            .map(|r| ListingEntry {
                display_name: if r.description.is_empty() {
                    r.symbol.clone()
                } else {
                    r.description
                },
                symbol: r.symbol.to_ascii_uppercase(),
                asset_class: AssetClass::Equity,
            })
            .collect())
    }
}
