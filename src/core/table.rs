//! Sortable, currency-switchable view over a computed projection.
use super::convert::convert_row;
use super::currency::Currency;
use super::error::{ProjectionError, Result, validate_rate};
use super::grid::approx_eq;
use super::projection::{PriceZone, ProjectionRow};
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Price,
    PortfolioValue,
    MarketCap,
    PctChange,
    MarketCapRatio,
}

impl SortColumn {
    fn key(&self, row: &ProjectionRow) -> Option<f64> {
        match self {
            SortColumn::Price => Some(row.price),
            SortColumn::PortfolioValue => Some(row.portfolio_value),
            SortColumn::MarketCap => Some(row.market_cap),
            SortColumn::PctChange => Some(row.pct_change_from_base),
            SortColumn::MarketCapRatio => row.market_cap_ratio,
        }
    }
}

impl Display for SortColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SortColumn::Price => "price",
                SortColumn::PortfolioValue => "value",
                SortColumn::MarketCap => "market-cap",
                SortColumn::PctChange => "change",
                SortColumn::MarketCapRatio => "ratio",
            }
        )
    }
}

impl FromStr for SortColumn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "price" => Ok(SortColumn::Price),
            "value" | "portfolio" | "portfolio-value" => Ok(SortColumn::PortfolioValue),
            "market-cap" | "marketcap" | "cap" => Ok(SortColumn::MarketCap),
            "change" | "pct-change" => Ok(SortColumn::PctChange),
            "ratio" => Ok(SortColumn::MarketCapRatio),
            _ => Err(anyhow::anyhow!("Invalid sort column: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: SortColumn,
    pub ascending: bool,
}

/// Ordered projection rows plus the currency and sort state used to show them.
///
/// The base-currency rows are kept as the source of truth and shared between
/// views; displayed rows are always derived from them with the view's rate.
#[derive(Debug, Clone)]
pub struct ProjectionTable {
    canonical: Arc<[ProjectionRow]>,
    base_currency: Currency,
    currency: Currency,
    rate: f64,
    order: Vec<usize>,
    sort: Option<SortState>,
}

impl ProjectionTable {
    pub fn new(rows: Vec<ProjectionRow>, base_currency: Currency) -> Self {
        let order = (0..rows.len()).collect();
        Self {
            canonical: rows.into(),
            base_currency,
            currency: base_currency,
            rate: 1.0,
            order,
            sort: None,
        }
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    pub fn base_currency(&self) -> Currency {
        self.base_currency
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Base-to-display rate of this view.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    /// Base-currency rows in grid order.
    pub fn canonical_rows(&self) -> &[ProjectionRow] {
        &self.canonical
    }

    /// Rows as displayed: in the view's currency and sort order.
    pub fn rows(&self) -> Vec<ProjectionRow> {
        self.order
            .iter()
            .map(|i| convert_row(&self.canonical[*i], self.rate))
            .collect()
    }

    /// Display position of the base price row, if the grid included it.
    pub fn base_row_position(&self) -> Option<usize> {
        self.order
            .iter()
            .position(|i| self.canonical[*i].zone == PriceZone::AtBase)
    }

    /// Stable sort over a numeric column; ties keep grid order. Rows without
    /// a value for the column go last in either direction.
    pub fn sort_by(&mut self, column: SortColumn, ascending: bool) {
        let canonical = &self.canonical;
        let mut order: Vec<usize> = (0..canonical.len()).collect();
        order.sort_by(|a, b| {
            match (column.key(&canonical[*a]), column.key(&canonical[*b])) {
                (Some(x), Some(y)) => {
                    let ord = x.total_cmp(&y);
                    if ascending { ord } else { ord.reverse() }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
        debug!(%column, ascending, "Sorted projection table");
        self.order = order;
        self.sort = Some(SortState { column, ascending });
    }

    /// A view of the same canonical rows in `currency`, where `rate` converts
    /// one unit of the base currency into `currency`.
    pub fn with_currency(&self, currency: Currency, rate: f64) -> Result<Self> {
        validate_rate(rate)?;
        if currency == self.base_currency && !approx_eq(rate, 1.0) {
            return Err(ProjectionError::InvalidRate(format!(
                "rate from {currency} to itself must be 1, got {rate}"
            )));
        }
        debug!(from = %self.base_currency, to = %currency, rate, "Switching table currency");
        Ok(Self {
            canonical: Arc::clone(&self.canonical),
            base_currency: self.base_currency,
            currency,
            rate,
            order: self.order.clone(),
            sort: self.sort,
        })
    }
}
