//! Headline figures for a holding at its current price.
use super::error::{ProjectionError, Result, ratio, validate_rate};
use super::input::PortfolioInput;
use serde::Serialize;

pub const DEFAULT_TARGET_VALUE: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioFacts {
    pub holdings: f64,
    pub price: f64,
    pub portfolio_value: f64,
    pub market_cap: f64,
    pub target_value: f64,
    /// Price at which the holding is worth `target_value`; undefined for an
    /// empty holding.
    pub price_for_target: Option<f64>,
    pub market_cap_for_target: Option<f64>,
    pub reference_market_cap: Option<f64>,
    /// How many reference market caps the target market cap amounts to.
    pub target_cap_ratio: Option<f64>,
}

impl PortfolioFacts {
    pub fn compute(
        input: &PortfolioInput,
        reference_market_cap: Option<f64>,
        target_value: f64,
    ) -> Result<Self> {
        input.validate()?;
        if !target_value.is_finite() || target_value <= 0.0 {
            return Err(ProjectionError::InvalidInput(format!(
                "target value must be a finite number greater than zero, got {target_value}"
            )));
        }
        if let Some(reference) = reference_market_cap {
            if !reference.is_finite() || reference < 0.0 {
                return Err(ProjectionError::InvalidInput(format!(
                    "reference market cap must be a finite number of at least zero, got {reference}"
                )));
            }
        }

        let price_for_target = ratio(target_value, input.holdings_amount).ok();
        let market_cap_for_target = price_for_target.map(|p| p * input.circulating_supply);
        let target_cap_ratio = market_cap_for_target
            .zip(reference_market_cap)
            .and_then(|(cap, reference)| ratio(cap, reference).ok());

        Ok(Self {
            holdings: input.holdings_amount,
            price: input.base_price,
            portfolio_value: input.holdings_amount * input.base_price,
            market_cap: input.circulating_supply * input.base_price,
            target_value,
            price_for_target,
            market_cap_for_target,
            reference_market_cap,
            target_cap_ratio,
        })
    }

    /// Monetary figures re-expressed with a base-to-target `rate`.
    pub fn converted(&self, rate: f64) -> Result<Self> {
        validate_rate(rate)?;
        Ok(Self {
            price: self.price * rate,
            portfolio_value: self.portfolio_value * rate,
            market_cap: self.market_cap * rate,
            target_value: self.target_value * rate,
            price_for_target: self.price_for_target.map(|v| v * rate),
            market_cap_for_target: self.market_cap_for_target.map(|v| v * rate),
            reference_market_cap: self.reference_market_cap.map(|v| v * rate),
            ..*self
        })
    }
}
