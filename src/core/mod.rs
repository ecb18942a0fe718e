//! Projection engine and core abstractions

pub mod cache;
pub mod config;
pub mod convert;
pub mod currency;
pub mod error;
pub mod facts;
pub mod grid;
pub mod input;
pub mod log;
pub mod market;
pub mod projection;
pub mod session;
pub mod table;

// Re-export main types for cleaner imports
pub use convert::convert;
pub use currency::{Currency, CurrencyRateProvider};
pub use error::ProjectionError;
pub use facts::PortfolioFacts;
pub use grid::{GridOptions, PriceGrid, generate, generate_composite};
pub use input::{IntervalSpec, PortfolioInput, SpacingMode};
pub use market::{AssetQuote, MarketDataProvider};
pub use projection::{PriceZone, ProjectionRow, compute};
pub use session::ProjectionSession;
pub use table::{ProjectionTable, SortColumn, SortState};
