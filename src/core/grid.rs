//! Price grid generation.
//!
//! A grid is the ascending set of hypothetical prices a projection is computed
//! over. Grids are built from one or more [`IntervalSpec`] rules and may have
//! the base price spliced in so the "current price" row always shows up.
use super::error::{ProjectionError, Result};
use super::input::{IntervalSpec, SpacingMode, validate_price};
use tracing::debug;

/// Relative tolerance under which two prices are treated as the same point.
pub const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Returns true when `a` and `b` are equal within [`RELATIVE_TOLERANCE`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= RELATIVE_TOLERANCE * a.abs().max(b.abs())
}

/// Strictly increasing, duplicate-free sequence of prices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceGrid {
    prices: Vec<f64>,
    base_index: Option<usize>,
}

impl PriceGrid {
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.prices.iter().copied()
    }

    /// Index of the force-included base price, if it was requested.
    pub fn base_index(&self) -> Option<usize> {
        self.base_index
    }

    fn from_points(mut points: Vec<f64>) -> Self {
        points.sort_by(f64::total_cmp);
        let mut prices: Vec<f64> = Vec::with_capacity(points.len());
        for point in points {
            match prices.last() {
                Some(last) if *last >= point || approx_eq(*last, point) => {}
                _ => prices.push(point),
            }
        }
        Self {
            prices,
            base_index: None,
        }
    }

    /// Splices `base_price` into the grid. Generated points within tolerance
    /// of the base price are replaced by it instead of producing a second
    /// row. With `decimals`, so is the point the base price rounds to, i.e.
    /// any rounded point within half a unit of it.
    fn insert_base(&mut self, base_price: f64, decimals: Option<u32>) {
        let rounded_base = decimals.map(|d| round_to(base_price, d));
        let coincides = |p: f64| {
            approx_eq(p, base_price) || rounded_base.is_some_and(|r| approx_eq(p, r))
        };
        let before = self.prices.len();
        self.prices.retain(|p| !coincides(*p));
        if self.prices.len() < before {
            debug!(
                replaced = before - self.prices.len(),
                "Base price coincides with generated points"
            );
        }

        let pos = self.prices.partition_point(|p| *p < base_price);
        self.prices.insert(pos, base_price);
        self.base_index = Some(pos);
    }
}

/// Controls applied when merging interval rules into one grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridOptions {
    pub include_base: bool,
    /// Round generated prices to this many decimal places.
    pub decimals: Option<u32>,
}

/// Generates the grid for a single interval rule.
pub fn generate(base_price: f64, spec: &IntervalSpec, include_base: bool) -> Result<PriceGrid> {
    validate_price("base price", base_price).map_err(ProjectionError::InvalidInput)?;
    spec.validate()?;

    let mut grid = PriceGrid::from_points(interval_points(spec));
    if include_base {
        grid.insert_base(base_price, None);
    }
    debug!(
        mode = %spec.mode,
        requested = spec.step_count,
        generated = grid.len(),
        "Generated price grid"
    );
    Ok(grid)
}

/// Merges several interval rules into a single grid.
pub fn generate_composite(
    base_price: f64,
    specs: &[IntervalSpec],
    options: &GridOptions,
) -> Result<PriceGrid> {
    validate_price("base price", base_price).map_err(ProjectionError::InvalidInput)?;
    if specs.is_empty() {
        return Err(ProjectionError::InvalidRange(
            "at least one price interval is required".to_string(),
        ));
    }

    let mut points = Vec::new();
    for spec in specs {
        spec.validate()?;
        points.extend(interval_points(spec));
    }
    if let Some(decimals) = options.decimals {
        points = points
            .into_iter()
            .map(|p| round_to(p, decimals))
            .filter(|p| *p > 0.0)
            .collect();
    }

    let mut grid = PriceGrid::from_points(points);
    if options.include_base {
        grid.insert_base(base_price, options.decimals);
    }
    if grid.is_empty() {
        return Err(ProjectionError::InvalidRange(format!(
            "no prices left after rounding to {} decimals",
            options.decimals.unwrap_or_default()
        )));
    }
    debug!(
        intervals = specs.len(),
        points = grid.len(),
        base_index = ?grid.base_index(),
        "Generated composite price grid"
    );
    Ok(grid)
}

fn interval_points(spec: &IntervalSpec) -> Vec<f64> {
    if spec.is_degenerate() || spec.step_count == 1 {
        return vec![spec.lower_bound];
    }

    let (lower, upper) = (spec.lower_bound, spec.upper_bound);
    let last = spec.step_count - 1;
    (0..spec.step_count)
        .map(|i| {
            if i == last {
                return upper;
            }
            let t = i as f64 / last as f64;
            match spec.mode {
                SpacingMode::Linear => lower + i as f64 * (upper - lower) / last as f64,
                SpacingMode::Logarithmic => lower * (upper / lower).powf(t),
            }
        })
        .collect()
}

fn round_to(price: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (price * factor).round() / factor
}
