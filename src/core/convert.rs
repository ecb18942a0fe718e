//! Currency conversion of computed projections.
use super::error::{Result, validate_rate};
use super::projection::ProjectionRow;
use tracing::debug;

/// Re-expresses rows in another currency.
///
/// Monetary columns are multiplied by `rate`; the percentage change and the
/// market cap ratio are dimensionless and carried over untouched. The input
/// rows are never modified, so callers should always convert from the
/// canonical base-currency rows.
pub fn convert(rows: &[ProjectionRow], rate: f64) -> Result<Vec<ProjectionRow>> {
    validate_rate(rate)?;
    debug!(rows = rows.len(), rate, "Converting projection rows");
    Ok(rows.iter().map(|row| convert_row(row, rate)).collect())
}

pub(crate) fn convert_row(row: &ProjectionRow, rate: f64) -> ProjectionRow {
    ProjectionRow {
        price: row.price * rate,
        portfolio_value: row.portfolio_value * rate,
        market_cap: row.market_cap * rate,
        ..*row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::Currency;
    use crate::core::error::ProjectionError;
    use crate::core::grid::generate;
    use crate::core::input::{IntervalSpec, PortfolioInput};
    use crate::core::projection::compute;
    use approx::assert_relative_eq;

    fn canonical_rows() -> Vec<ProjectionRow> {
        let input = PortfolioInput::new(1367.0, 0.2711, 25_600_000_000.0, Currency::Usd).unwrap();
        let spec = IntervalSpec::logarithmic(40, 0.01, 1000.0).unwrap();
        let grid = generate(input.base_price, &spec, true).unwrap();
        compute(&input, &grid, Some(1_900_000_000_000.0)).unwrap()
    }

    fn assert_rows_close(actual: &[ProjectionRow], expected: &[ProjectionRow]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert_relative_eq!(a.price, e.price, max_relative = 1e-9);
            assert_relative_eq!(a.portfolio_value, e.portfolio_value, max_relative = 1e-9);
            assert_relative_eq!(a.market_cap, e.market_cap, max_relative = 1e-9);
            assert_eq!(a.pct_change_from_base, e.pct_change_from_base);
            assert_eq!(a.market_cap_ratio, e.market_cap_ratio);
            assert_eq!(a.zone, e.zone);
        }
    }

    #[test]
    fn test_unit_rate_is_identity() {
        let rows = canonical_rows();
        let converted = convert(&rows, 1.0).unwrap();
        assert_rows_close(&converted, &rows);
    }

    #[test]
    fn test_monetary_columns_scale() {
        let rows = canonical_rows();
        let converted = convert(&rows, 149.5).unwrap();
        for (c, r) in converted.iter().zip(&rows) {
            assert_relative_eq!(c.price, r.price * 149.5);
            assert_relative_eq!(c.portfolio_value, r.portfolio_value * 149.5);
            assert_relative_eq!(c.market_cap, r.market_cap * 149.5);
            assert_eq!(c.pct_change_from_base, r.pct_change_from_base);
            assert_eq!(c.market_cap_ratio, r.market_cap_ratio);
        }
    }

    #[test]
    fn test_inverse_rate_reproduces_base_values() {
        let rows = canonical_rows();
        let eur_rate = 0.92;
        let eur = convert(&rows, eur_rate).unwrap();
        let back = convert(&eur, 1.0 / eur_rate).unwrap();
        assert_rows_close(&back, &rows);
    }

    #[test]
    fn test_input_rows_are_not_mutated() {
        let rows = canonical_rows();
        let snapshot = rows.clone();
        let _ = convert(&rows, 0.79).unwrap();
        assert_eq!(rows, snapshot);
    }

    #[test]
    fn test_invalid_rates_rejected() {
        let rows = canonical_rows();
        for rate in [0.0, -0.92, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                convert(&rows, rate),
                Err(ProjectionError::InvalidRate(_))
            ));
        }
    }
}
