pub mod batch;
pub mod market;
pub mod quotes;

pub mod util;
