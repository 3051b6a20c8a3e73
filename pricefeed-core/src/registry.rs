use std::collections::BTreeSet;

use pricefeed_types::AssetClass;

const CRYPTO: &[&str] = &[
    "BTC", "ETH", "SOL", "XRP", "ADA", "DOGE", "DOT", "AVAX", "MATIC", "LINK", "LTC", "BCH",
    "XLM", "ATOM", "UNI", "TRX", "BNB", "USDT", "USDC", "DAI", "SHIB", "NEAR", "APT", "ARB",
    "OP", "PEPE", "TON",
];

const CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "NZD", "CNY", "HKD", "SEK", "NOK", "DKK",
    "SGD", "INR", "MXN", "BRL", "ZAR", "TRY", "PLN", "KRW",
];

const COMMODITIES: &[&str] = &[
    "GC", "SI", "CL", "BZ", "NG", "HG", "PL", "PA", "ZC", "ZW", "ZS", "KC", "CC", "SB", "XAU",
    "XAG",
];

const INDICES: &[&str] = &[
    "SPX", "NDX", "DJI", "RUT", "VIX", "FTSE", "DAX", "N225", "HSI", "CAC", "STOXX50E",
];

/// Known-symbol heuristics used to guess an asset class when the caller gave
/// no hint.
///
/// Classification order: explicit suffix/prefix markers (`^`, `=X`, `=F`),
/// then the curated crypto, index and commodity sets, then six-letter currency
/// pairs; everything else is assumed to be an equity.
#[derive(Debug, Clone)]
pub struct SymbolRegistry {
    crypto: BTreeSet<String>,
    currencies: BTreeSet<String>,
    commodities: BTreeSet<String>,
    indices: BTreeSet<String>,
}

fn owned(set: &[&str]) -> BTreeSet<String> {
    set.iter().map(|s| (*s).to_string()).collect()
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self {
            crypto: owned(CRYPTO),
            currencies: owned(CURRENCIES),
            commodities: owned(COMMODITIES),
            indices: owned(INDICES),
        }
    }
}

impl SymbolRegistry {
    /// Registry with the built-in curated sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with no curated symbols; only structural markers classify.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            crypto: BTreeSet::new(),
            currencies: BTreeSet::new(),
            commodities: BTreeSet::new(),
            indices: BTreeSet::new(),
        }
    }

    /// Add symbols to a class's curated set.
    ///
    /// Forex and equity have no curated set; forex pairs are recognized from
    /// their currency codes and equity is the default.
    #[must_use]
    pub fn with_known<I, S>(mut self, class: AssetClass, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let target = match class {
            AssetClass::Crypto => &mut self.crypto,
            AssetClass::Commodity => &mut self.commodities,
            AssetClass::Index => &mut self.indices,
            AssetClass::Forex => &mut self.currencies,
            AssetClass::Equity => return self,
        };
        target.extend(symbols.into_iter().map(|s| s.as_ref().trim().to_ascii_uppercase()));
        self
    }

    /// Best guess for a canonical symbol.
    #[must_use]
    pub fn classify(&self, symbol: &str) -> AssetClass {
        if symbol.starts_with('^') || self.indices.contains(symbol) {
            return AssetClass::Index;
        }
        if symbol.ends_with("=X") || self.is_currency_pair(symbol) {
            return AssetClass::Forex;
        }
        if symbol.ends_with("=F") || self.commodities.contains(symbol) {
            return AssetClass::Commodity;
        }
        if self.crypto.contains(symbol) || self.is_crypto_pair(symbol) {
            return AssetClass::Crypto;
        }
        AssetClass::Equity
    }

    /// Classes to try in order: the guess first, then the rest in the fixed
    /// fallback order.
    #[must_use]
    pub fn candidates(&self, symbol: &str) -> Vec<AssetClass> {
        let first = self.classify(symbol);
        std::iter::once(first)
            .chain(AssetClass::ALL.into_iter().filter(|c| *c != first))
            .collect()
    }

    fn is_currency_pair(&self, symbol: &str) -> bool {
        symbol.len() == 6
            && symbol.is_char_boundary(3)
            && self.currencies.contains(&symbol[..3])
            && self.currencies.contains(&symbol[3..])
    }

    // BTC-USD style quote pairs.
    fn is_crypto_pair(&self, symbol: &str) -> bool {
        symbol
            .split_once('-')
            .is_some_and(|(base, quote)| self.crypto.contains(base) && self.currencies.contains(quote))
    }
}
