//! pricefeed-providers
//!
//! Upstream adapters implementing `PriceProvider`:
//!
//! - `coingecko`: crypto spot prices through the `/simple/price` batch endpoint.
//! - `finnhub`: equity quotes, candles and the US symbol directory (API key required).
//! - `yahoo`: every asset class through the batch quote and chart endpoints.
//!
//! Each adapter deserializes into its own raw response types and normalizes them
//! into `PriceRecord` before returning. HTTP is reached through the
//! [`HttpTransport`] trait so tests can inject canned responses.
#![warn(missing_docs)]

/// CoinGecko adapter.
pub mod coingecko;
/// Finnhub adapter.
pub mod finnhub;
/// HTTP transport abstraction and the `reqwest` implementation.
pub mod transport;
/// Yahoo Finance adapter.
pub mod yahoo;

pub use coingecko::CoinGeckoProvider;
pub use finnhub::FinnhubProvider;
pub use transport::{HttpTransport, ReqwestTransport};
pub use yahoo::YahooProvider;

use rust_decimal::Decimal;

/// Convert an upstream float, rejecting NaN and infinities.
pub(crate) fn decimal(v: f64) -> Option<Decimal> {
    Decimal::try_from(v).ok().map(|d| d.round_dp(8).normalize())
}

/// Decode a JSON value into a provider's raw response type.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    provider: &str,
    value: serde_json::Value,
) -> Result<T, pricefeed_core::PricefeedError> {
    serde_json::from_value(value)
        .map_err(|e| pricefeed_core::PricefeedError::Data(format!("{provider}: unexpected payload: {e}")))
}
