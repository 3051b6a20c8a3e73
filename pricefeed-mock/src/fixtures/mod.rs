pub mod history;
pub mod quotes;

pub const PROVIDER: &str = "pricefeed-mock";
