use std::sync::Arc;

use pricefeed_types::{DataCategory, ListingEntry, PricePoint, PriceRecord};

/// Everything the market cache stores, one variant per data category.
///
/// Series and listings are reference-counted so cache reads stay cheap.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketValue {
    /// Live quote.
    Price(PriceRecord),
    /// Detailed snapshot.
    Snapshot(PriceRecord),
    /// Historical close series.
    History(Arc<Vec<PricePoint>>),
    /// Class directory.
    Directory(Arc<Vec<ListingEntry>>),
}

impl MarketValue {
    /// Category this value is cached under.
    #[must_use]
    pub const fn category(&self) -> DataCategory {
        match self {
            Self::Price(_) => DataCategory::Quote,
            Self::Snapshot(_) => DataCategory::Snapshot,
            Self::History(_) => DataCategory::Historical,
            Self::Directory(_) => DataCategory::Directory,
        }
    }

    /// The live quote, if this is one.
    #[must_use]
    pub fn into_price(self) -> Option<PriceRecord> {
        match self {
            Self::Price(r) => Some(r),
            _ => None,
        }
    }

    /// The snapshot, if this is one.
    #[must_use]
    pub fn into_snapshot(self) -> Option<PriceRecord> {
        match self {
            Self::Snapshot(r) => Some(r),
            _ => None,
        }
    }

    /// The series, if this is one.
    #[must_use]
    pub fn into_history(self) -> Option<Arc<Vec<PricePoint>>> {
        match self {
            Self::History(h) => Some(h),
            _ => None,
        }
    }

    /// The directory, if this is one.
    #[must_use]
    pub fn into_directory(self) -> Option<Arc<Vec<ListingEntry>>> {
        match self {
            Self::Directory(d) => Some(d),
            _ => None,
        }
    }
}
