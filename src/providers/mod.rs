pub mod coingecko;
pub mod util;
pub mod yahoo_finance;

// Re-export the shared cache so providers can be wired up from one place
pub use crate::core::cache::Cache;
