//! Explicit state of one projection session.
use super::error::Result;
use super::facts::PortfolioFacts;
use super::grid::{GridOptions, PriceGrid, generate_composite};
use super::input::{IntervalSpec, PortfolioInput};
use super::projection::compute;
use super::table::ProjectionTable;
use tracing::info;

/// Everything the engine needs, validated and owned by the caller.
///
/// Changing any field means building a fresh table; views of an existing
/// table (sorting, currency) never need the session again.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionSession {
    pub input: PortfolioInput,
    pub intervals: Vec<IntervalSpec>,
    pub grid_options: GridOptions,
    pub reference_market_cap: Option<f64>,
}

impl ProjectionSession {
    pub fn grid(&self) -> Result<PriceGrid> {
        generate_composite(self.input.base_price, &self.intervals, &self.grid_options)
    }

    pub fn build_table(&self) -> Result<ProjectionTable> {
        let grid = self.grid()?;
        let rows = compute(&self.input, &grid, self.reference_market_cap)?;
        info!(rows = rows.len(), currency = %self.input.base_currency, "Built projection table");
        Ok(ProjectionTable::new(rows, self.input.base_currency))
    }

    pub fn facts(&self, target_value: f64) -> Result<PortfolioFacts> {
        PortfolioFacts::compute(&self.input, self.reference_market_cap, target_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::Currency;
    use crate::core::error::ProjectionError;
    use crate::core::projection::PriceZone;

    fn session() -> ProjectionSession {
        ProjectionSession {
            input: PortfolioInput::new(1367.0, 0.2711, 25_600_000_000.0, Currency::Usd).unwrap(),
            intervals: vec![
                IntervalSpec::linear(9, 0.01, 0.2711).unwrap(),
                IntervalSpec::logarithmic(240, 0.2711, 1000.0).unwrap(),
            ],
            grid_options: GridOptions {
                include_base: true,
                decimals: Some(4),
            },
            reference_market_cap: Some(1_900_000_000_000.0),
        }
    }

    #[test]
    fn test_build_table_contains_base_row() {
        let table = session().build_table().unwrap();
        assert!(!table.is_empty());
        let position = table.base_row_position().unwrap();
        let base = table.rows()[position];
        assert_eq!(base.zone, PriceZone::AtBase);
        assert_eq!(base.price, 0.2711);
        assert_eq!(base.pct_change_from_base, 0.0);
        assert!(table.rows()[..position].iter().all(|r| r.zone == PriceZone::Below));
        assert!(table.rows()[position + 1..].iter().all(|r| r.zone == PriceZone::Above));
    }

    #[test]
    fn test_build_is_repeatable() {
        let session = session();
        assert_eq!(
            session.build_table().unwrap().rows(),
            session.build_table().unwrap().rows()
        );
    }

    #[test]
    fn test_build_fails_fast_on_bad_interval() {
        let mut session = session();
        session.intervals.push(IntervalSpec {
            mode: crate::core::input::SpacingMode::Linear,
            step_count: 3,
            lower_bound: 5.0,
            upper_bound: 1.0,
        });
        assert!(matches!(
            session.build_table(),
            Err(ProjectionError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_facts_use_session_reference() {
        let facts = session().facts(1_000_000.0).unwrap();
        assert!(facts.target_cap_ratio.is_some());
    }
}
