use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PricefeedError;

/// Asset class of an instrument.
///
/// The class decides which provider chain answers for a symbol and is part of
/// every cache key, so `BTC` as a crypto and `BTC` as an equity never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    /// Cryptocurrencies (BTC, ETH, ...).
    Crypto,
    /// Listed equities and funds.
    Equity,
    /// Currency pairs.
    Forex,
    /// Commodity futures and spot metals.
    Commodity,
    /// Market indices.
    Index,
}

impl AssetClass {
    /// All classes in the fixed fallback order used when a guess yields nothing.
    pub const ALL: [Self; 5] = [
        Self::Crypto,
        Self::Equity,
        Self::Forex,
        Self::Commodity,
        Self::Index,
    ];

    /// Stable lowercase identifier used in cache keys and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crypto => "crypto",
            Self::Equity => "equity",
            Self::Forex => "forex",
            Self::Commodity => "commodity",
            Self::Index => "index",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = PricefeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crypto" | "cryptocurrency" => Ok(Self::Crypto),
            "equity" | "stock" => Ok(Self::Equity),
            "forex" | "fx" => Ok(Self::Forex),
            "commodity" => Ok(Self::Commodity),
            "index" => Ok(Self::Index),
            other => Err(PricefeedError::InvalidArg(format!(
                "unknown asset class: {other:?}"
            ))),
        }
    }
}

/// Category of cached market data; each category carries its own TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCategory {
    /// Live price quote.
    Quote,
    /// Detailed market snapshot (quote plus auxiliary fields).
    Snapshot,
    /// Symbol directory / listing.
    Directory,
    /// Historical price series.
    Historical,
}

impl DataCategory {
    /// Stable identifier for logs/errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Snapshot => "snapshot",
            Self::Directory => "directory",
            Self::Historical => "historical",
        }
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookback period of a historical series request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryPeriod {
    /// One day.
    #[serde(rename = "1d")]
    D1,
    /// Five days.
    #[serde(rename = "5d")]
    D5,
    /// One month.
    #[serde(rename = "1mo")]
    M1,
    /// Three months.
    #[serde(rename = "3mo")]
    M3,
    /// One year.
    #[serde(rename = "1y")]
    Y1,
    /// Five years.
    #[serde(rename = "5y")]
    Y5,
}

impl HistoryPeriod {
    /// Compact identifier used in cache keys and provider query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::D1 => "1d",
            Self::D5 => "5d",
            Self::M1 => "1mo",
            Self::M3 => "3mo",
            Self::Y1 => "1y",
            Self::Y5 => "5y",
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryPeriod {
    type Err = PricefeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1d" => Ok(Self::D1),
            "5d" => Ok(Self::D5),
            "1mo" => Ok(Self::M1),
            "3mo" => Ok(Self::M3),
            "1y" => Ok(Self::Y1),
            "5y" => Ok(Self::Y5),
            other => Err(PricefeedError::InvalidArg(format!(
                "unknown history period: {other:?}"
            ))),
        }
    }
}
