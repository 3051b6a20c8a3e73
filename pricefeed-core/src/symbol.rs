use std::collections::HashSet;

use pricefeed_types::PricefeedError;

/// Canonical form of a user-supplied symbol: trimmed and uppercased.
///
/// # Errors
/// Returns `InvalidArg` for an empty symbol or one containing whitespace or the
/// characters `:`, `*`, `?` (which would corrupt cache keys and patterns).
pub fn normalize_symbol(raw: &str) -> Result<String, PricefeedError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(PricefeedError::InvalidArg("symbol is empty".into()));
    }
    if s.chars().any(|c| c.is_whitespace() || matches!(c, ':' | '*' | '?')) {
        return Err(PricefeedError::InvalidArg(format!(
            "symbol contains reserved characters: {s:?}"
        )));
    }
    Ok(s.to_ascii_uppercase())
}

/// Normalize a list and drop duplicates, keeping first-seen order.
///
/// # Errors
/// Returns `InvalidArg` for an empty list or any invalid symbol.
pub fn normalize_symbols<S: AsRef<str>>(raw: &[S]) -> Result<Vec<String>, PricefeedError> {
    if raw.is_empty() {
        return Err(PricefeedError::InvalidArg("symbol list is empty".into()));
    }
    let mut seen = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());
    for r in raw {
        let s = normalize_symbol(r.as_ref())?;
        if seen.insert(s.clone()) {
            out.push(s);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn trims_and_uppercases() {
        assert_eq!(normalize_symbol("  btc ").unwrap(), "BTC");
        assert_eq!(normalize_symbol("^gspc").unwrap(), "^GSPC");
        assert_eq!(normalize_symbol("eurusd=x").unwrap(), "EURUSD=X");
    }

    #[test]
    fn rejects_empty_and_reserved() {
        assert!(matches!(normalize_symbol("   "), Err(PricefeedError::InvalidArg(_))));
        assert!(normalize_symbol("BTC:USD").is_err());
        assert!(normalize_symbol("BT*").is_err());
        assert!(normalize_symbol("BRK B").is_err());
    }

    #[test]
    fn dedupes_in_first_seen_order() {
        let out = normalize_symbols(&["eth", "BTC", "Eth", "sol", "btc"]).unwrap();
        assert_eq!(out, vec!["ETH", "BTC", "SOL"]);
    }

    #[test]
    fn empty_list_is_invalid() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            normalize_symbols(&empty),
            Err(PricefeedError::InvalidArg(_))
        ));
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(s in "[a-zA-Z0-9.^=-]{1,10}") {
            let once = normalize_symbol(&s).unwrap();
            let twice = normalize_symbol(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn output_has_no_duplicates(v in proptest::collection::vec("[a-cA-C]{1,2}", 1..20)) {
            let out = normalize_symbols(&v).unwrap();
            let unique: HashSet<_> = out.iter().collect();
            prop_assert_eq!(unique.len(), out.len());
        }
    }
}
