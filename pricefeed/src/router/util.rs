use pricefeed_core::PricefeedError;

/// Collapse a set of provider errors into a uniform `PricefeedError` outcome.
///
/// Rules:
/// - If `attempted_any` is false → `Unsupported(capability)`.
/// - If all errors are `ProviderTimeout` → `AllProvidersTimedOut(capability)`.
/// - If `not_found_what` is `Some` and all errors are `NotFound` → `NotFound(what)`.
/// - Else → `AllProvidersFailed(errors)`.
pub fn collapse_errors(
    capability: &str,
    attempted_any: bool,
    errors: Vec<PricefeedError>,
    not_found_what: Option<String>,
) -> PricefeedError {
    if !attempted_any {
        return PricefeedError::unsupported(capability);
    }
    if !errors.is_empty()
        && errors
            .iter()
            .all(|e| matches!(e, PricefeedError::ProviderTimeout { .. }))
    {
        return PricefeedError::AllProvidersTimedOut {
            capability: capability.to_string(),
        };
    }
    if let Some(what) = not_found_what
        && !errors.is_empty()
        && errors
            .iter()
            .all(|e| matches!(e, PricefeedError::NotFound { .. }))
    {
        return PricefeedError::not_found(what);
    }
    PricefeedError::AllProvidersFailed(errors)
}

/// Split `symbols` into chunks of at most `size` (a zero size counts as one).
pub(crate) fn chunked(symbols: &[String], size: usize) -> Vec<Vec<String>> {
    symbols.chunks(size.max(1)).map(<[String]>::to_vec).collect()
}
