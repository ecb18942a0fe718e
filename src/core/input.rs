//! Strongly typed engine inputs.

use super::currency::Currency;
use super::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// A fixed holding of one asset, priced in `base_currency`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioInput {
    pub holdings_amount: f64,
    pub base_price: f64,
    pub circulating_supply: f64,
    pub base_currency: Currency,
}

impl PortfolioInput {
    pub fn new(
        holdings_amount: f64,
        base_price: f64,
        circulating_supply: f64,
        base_currency: Currency,
    ) -> Result<Self> {
        let input = Self {
            holdings_amount,
            base_price,
            circulating_supply,
            base_currency,
        };
        input.validate()?;
        Ok(input)
    }

    /// Holdings may be zero; price and supply must be strictly positive.
    pub fn validate(&self) -> Result<()> {
        if !self.holdings_amount.is_finite() || self.holdings_amount < 0.0 {
            return Err(ProjectionError::InvalidInput(format!(
                "holdings amount must be a finite number of at least zero, got {}",
                self.holdings_amount
            )));
        }
        validate_price("base price", self.base_price).map_err(ProjectionError::InvalidInput)?;
        if !self.circulating_supply.is_finite() || self.circulating_supply <= 0.0 {
            return Err(ProjectionError::InvalidInput(format!(
                "circulating supply must be a finite number greater than zero, got {}",
                self.circulating_supply
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_price(name: &str, value: f64) -> std::result::Result<(), String> {
    if !value.is_finite() || value <= 0.0 {
        return Err(format!(
            "{name} must be a finite number greater than zero, got {value}"
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpacingMode {
    Linear,
    #[serde(alias = "log")]
    Logarithmic,
}

impl Display for SpacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SpacingMode::Linear => "linear",
                SpacingMode::Logarithmic => "logarithmic",
            }
        )
    }
}

impl FromStr for SpacingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" | "lin" => Ok(SpacingMode::Linear),
            "logarithmic" | "log" | "geometric" => Ok(SpacingMode::Logarithmic),
            _ => Err(anyhow::anyhow!("Invalid spacing mode: {}", s)),
        }
    }
}

/// One interval rule: `step_count` prices between two bounds.
///
/// The bounds are a caller-supplied range; they are not required to bracket
/// the base price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalSpec {
    pub mode: SpacingMode,
    pub step_count: usize,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl IntervalSpec {
    pub fn new(mode: SpacingMode, step_count: usize, lower_bound: f64, upper_bound: f64) -> Result<Self> {
        let spec = Self {
            mode,
            step_count,
            lower_bound,
            upper_bound,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn linear(step_count: usize, lower_bound: f64, upper_bound: f64) -> Result<Self> {
        Self::new(SpacingMode::Linear, step_count, lower_bound, upper_bound)
    }

    pub fn logarithmic(step_count: usize, lower_bound: f64, upper_bound: f64) -> Result<Self> {
        Self::new(SpacingMode::Logarithmic, step_count, lower_bound, upper_bound)
    }

    pub fn validate(&self) -> Result<()> {
        if self.step_count == 0 {
            return Err(ProjectionError::InvalidRange(
                "step count must be at least 1".to_string(),
            ));
        }
        validate_price("lower bound", self.lower_bound).map_err(ProjectionError::InvalidRange)?;
        validate_price("upper bound", self.upper_bound).map_err(ProjectionError::InvalidRange)?;
        if self.upper_bound < self.lower_bound {
            return Err(ProjectionError::InvalidRange(format!(
                "upper bound must exceed lower bound ({} < {})",
                self.upper_bound, self.lower_bound
            )));
        }
        Ok(())
    }

    /// Equal bounds collapse to a single point whatever the requested count.
    pub fn is_degenerate(&self) -> bool {
        self.lower_bound == self.upper_bound
    }
}
