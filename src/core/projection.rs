//! Per-price projection of a holding.
use super::error::{ProjectionError, Result, ratio};
use super::grid::{PriceGrid, approx_eq};
use super::input::PortfolioInput;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where a grid price sits relative to the base price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceZone {
    Below,
    AtBase,
    Above,
}

impl PriceZone {
    pub fn classify(price: f64, base_price: f64) -> Self {
        if approx_eq(price, base_price) {
            PriceZone::AtBase
        } else if price < base_price {
            PriceZone::Below
        } else {
            PriceZone::Above
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceZone::Below => "below",
            PriceZone::AtBase => "at_base",
            PriceZone::Above => "above",
        }
    }
}

/// One grid price with all its derived metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub price: f64,
    pub portfolio_value: f64,
    pub market_cap: f64,
    /// Fractional change from the base price (0.5 is +50%).
    pub pct_change_from_base: f64,
    /// `None` when no reference market cap was supplied or it was zero.
    pub market_cap_ratio: Option<f64>,
    pub zone: PriceZone,
}

/// Computes one row per grid price, in grid (ascending price) order.
pub fn compute(
    input: &PortfolioInput,
    grid: &PriceGrid,
    reference_market_cap: Option<f64>,
) -> Result<Vec<ProjectionRow>> {
    input.validate()?;
    if let Some(reference) = reference_market_cap {
        if !reference.is_finite() || reference < 0.0 {
            return Err(ProjectionError::InvalidInput(format!(
                "reference market cap must be a finite number of at least zero, got {reference}"
            )));
        }
    }
    debug_assert!(input.base_price > 0.0);

    let base_price = input.base_price;
    let mut undefined_ratios = 0;
    let rows: Vec<ProjectionRow> = grid
        .iter()
        .map(|price| {
            let market_cap = input.circulating_supply * price;
            let market_cap_ratio = reference_market_cap.and_then(|reference| {
                match ratio(market_cap, reference) {
                    Ok(r) => Some(r),
                    Err(_) => {
                        undefined_ratios += 1;
                        None
                    }
                }
            });
            ProjectionRow {
                price,
                portfolio_value: input.holdings_amount * price,
                market_cap,
                pct_change_from_base: (price - base_price) / base_price,
                market_cap_ratio,
                zone: PriceZone::classify(price, base_price),
            }
        })
        .collect();

    if undefined_ratios > 0 {
        debug!(
            rows = undefined_ratios,
            "Reference market cap is zero, market cap ratio left undefined"
        );
    }
    debug!(rows = rows.len(), "Computed projection");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::Currency;
    use crate::core::grid::generate;
    use crate::core::input::IntervalSpec;
    use approx::assert_relative_eq;

    fn kaspa_input() -> PortfolioInput {
        PortfolioInput::new(100.0, 0.10, 1_000_000_000.0, Currency::Usd).unwrap()
    }

    fn grid_around_base() -> PriceGrid {
        let spec = IntervalSpec::linear(5, 0.05, 0.25).unwrap();
        generate(0.10, &spec, true).unwrap()
    }

    #[test]
    fn test_row_at_base_price() {
        let rows = compute(&kaspa_input(), &grid_around_base(), None).unwrap();
        let base = rows.iter().find(|r| r.zone == PriceZone::AtBase).unwrap();
        assert_relative_eq!(base.price, 0.10);
        assert_relative_eq!(base.portfolio_value, 10.0);
        assert_relative_eq!(base.market_cap, 100_000_000.0);
        assert_eq!(base.pct_change_from_base, 0.0);
        assert_eq!(base.market_cap_ratio, None);
    }

    #[test]
    fn test_rows_follow_grid_order() {
        let grid = grid_around_base();
        let rows = compute(&kaspa_input(), &grid, None).unwrap();
        assert_eq!(rows.len(), grid.len());
        for (row, price) in rows.iter().zip(grid.iter()) {
            assert_eq!(row.price, price);
        }
        assert_eq!(rows[0].zone, PriceZone::Below);
        assert_eq!(rows.last().unwrap().zone, PriceZone::Above);
        assert_relative_eq!(rows[0].pct_change_from_base, -0.5, max_relative = 1e-12);
        assert_relative_eq!(rows.last().unwrap().pct_change_from_base, 1.5, max_relative = 1e-12);
    }

    #[test]
    fn test_market_cap_ratio() {
        let rows = compute(&kaspa_input(), &grid_around_base(), Some(2_000_000_000.0)).unwrap();
        let base = rows.iter().find(|r| r.zone == PriceZone::AtBase).unwrap();
        assert_relative_eq!(base.market_cap_ratio.unwrap(), 0.05);
    }

    #[test]
    fn test_zero_reference_market_cap_leaves_ratio_undefined() {
        let rows = compute(&kaspa_input(), &grid_around_base(), Some(0.0)).unwrap();
        assert!(rows.iter().all(|r| r.market_cap_ratio.is_none()));
        assert!(rows.iter().all(|r| r.market_cap.is_finite()));
    }

    #[test]
    fn test_invalid_reference_market_cap() {
        for reference in [f64::NAN, f64::INFINITY, -1.0] {
            assert!(matches!(
                compute(&kaspa_input(), &grid_around_base(), Some(reference)),
                Err(ProjectionError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_zero_supply_fails() {
        let input = PortfolioInput {
            holdings_amount: 100.0,
            base_price: 0.10,
            circulating_supply: 0.0,
            base_currency: Currency::Usd,
        };
        let err = compute(&input, &grid_around_base(), None).unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidInput(_)));
        assert!(err.to_string().contains("circulating supply"));
    }

    #[test]
    fn test_negative_holdings_fail() {
        let input = PortfolioInput {
            holdings_amount: -5.0,
            ..kaspa_input()
        };
        assert!(matches!(
            compute(&input, &grid_around_base(), None),
            Err(ProjectionError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_holdings_allowed() {
        let input = PortfolioInput {
            holdings_amount: 0.0,
            ..kaspa_input()
        };
        let rows = compute(&input, &grid_around_base(), None).unwrap();
        assert!(rows.iter().all(|r| r.portfolio_value == 0.0));
    }

    #[test]
    fn test_compute_does_not_touch_inputs() {
        let input = kaspa_input();
        let grid = grid_around_base();
        let before = (input, grid.clone());
        let _ = compute(&input, &grid, Some(1.0)).unwrap();
        assert_eq!(before, (input, grid));
    }

    #[test]
    fn test_price_zone_classification() {
        assert_eq!(PriceZone::classify(1.0, 2.0), PriceZone::Below);
        assert_eq!(PriceZone::classify(2.0 + 1e-15, 2.0), PriceZone::AtBase);
        assert_eq!(PriceZone::classify(3.0, 2.0), PriceZone::Above);
    }
}
