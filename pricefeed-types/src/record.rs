//! Normalized price records handed out by the façade.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::asset::AssetClass;

/// Value of an auxiliary field attached to a [`PriceRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuxValue {
    /// Numeric field (volume, market cap, day high, ...).
    Number(Decimal),
    /// Free-form text field (exchange name, market state, ...).
    Text(String),
}

impl From<Decimal> for AuxValue {
    fn from(v: Decimal) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for AuxValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AuxValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Provider-independent price snapshot for one symbol.
///
/// Records are immutable once built: the `with_*` methods consume the record
/// and are meant for the normalization step at the provider boundary. A new
/// fetch always produces a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    symbol: String,
    display_name: String,
    price: Decimal,
    absolute_change: Decimal,
    percent_change: Decimal,
    asset_class: AssetClass,
    observed_at: DateTime<Utc>,
    provenance: String,
    auxiliary: BTreeMap<String, Option<AuxValue>>,
}

impl PriceRecord {
    /// Create a record with zero change, the symbol as display name and `now` as
    /// observation time. The symbol is canonicalized to trimmed uppercase.
    pub fn new(
        symbol: &str,
        asset_class: AssetClass,
        price: Decimal,
        provenance: impl Into<String>,
    ) -> Self {
        let symbol = symbol.trim().to_ascii_uppercase();
        Self {
            display_name: symbol.clone(),
            symbol,
            price,
            absolute_change: Decimal::ZERO,
            percent_change: Decimal::ZERO,
            asset_class,
            observed_at: Utc::now(),
            provenance: provenance.into(),
            auxiliary: BTreeMap::new(),
        }
    }

    /// Set the human-readable name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Set absolute and percent change over the reference period.
    #[must_use]
    pub fn with_change(mut self, absolute: Decimal, percent: Decimal) -> Self {
        self.absolute_change = absolute;
        self.percent_change = percent;
        self
    }

    /// Derive absolute and percent change from a previous close.
    ///
    /// A zero previous close leaves the percent change at zero.
    #[must_use]
    pub fn with_previous_close(mut self, previous_close: Decimal) -> Self {
        self.absolute_change = self.price - previous_close;
        self.percent_change = if previous_close.is_zero() {
            Decimal::ZERO
        } else {
            (self.absolute_change / previous_close * Decimal::ONE_HUNDRED).round_dp(4)
        };
        self
    }

    /// Set the observation timestamp.
    #[must_use]
    pub fn with_observed_at(mut self, ts: DateTime<Utc>) -> Self {
        self.observed_at = ts;
        self
    }

    /// Attach an auxiliary field. `None` records that the provider reported the
    /// field as unavailable.
    #[must_use]
    pub fn with_aux(mut self, key: impl Into<String>, value: Option<AuxValue>) -> Self {
        self.auxiliary.insert(key.into(), value);
        self
    }

    /// Canonical uppercase symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Human-readable name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Last traded price.
    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// Absolute change over the reference period.
    #[must_use]
    pub const fn absolute_change(&self) -> Decimal {
        self.absolute_change
    }

    /// Percent change over the reference period.
    #[must_use]
    pub const fn percent_change(&self) -> Decimal {
        self.percent_change
    }

    /// Asset class the record was fetched as.
    #[must_use]
    pub const fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    /// Time the upstream observed the price.
    #[must_use]
    pub const fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Name of the provider that answered.
    #[must_use]
    pub fn provenance(&self) -> &str {
        &self.provenance
    }

    /// Auxiliary fields (volume, market cap, ...).
    #[must_use]
    pub const fn auxiliary(&self) -> &BTreeMap<String, Option<AuxValue>> {
        &self.auxiliary
    }

    /// Convenience lookup for a numeric auxiliary field.
    #[must_use]
    pub fn aux_number(&self, key: &str) -> Option<Decimal> {
        match self.auxiliary.get(key) {
            Some(Some(AuxValue::Number(n))) => Some(*n),
            _ => None,
        }
    }
}

/// One point of a historical series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Bar timestamp.
    pub ts: DateTime<Utc>,
    /// Closing price of the bar.
    pub close: Decimal,
    /// Traded volume, if reported.
    pub volume: Option<Decimal>,
}

/// Entry of a symbol directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// Canonical uppercase symbol.
    pub symbol: String,
    /// Human-readable name.
    pub display_name: String,
    /// Class the listing belongs to.
    pub asset_class: AssetClass,
}
