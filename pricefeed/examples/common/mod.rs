use pricefeed::PriceProvider;
use std::sync::Arc;

#[must_use]
pub fn get_provider() -> Arc<dyn PriceProvider> {
    if std::env::var("PRICEFEED_EXAMPLES_USE_MOCK").is_ok() {
        println!("--- (Using Mock Provider for CI) ---");
        Arc::new(pricefeed_mock::MockProvider::new())
    } else {
        // Yahoo needs no API key and serves every asset class.
        Arc::new(pricefeed_providers::YahooProvider::new())
    }
}
