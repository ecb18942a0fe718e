//! Market data abstractions

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Latest figures for one asset. A `None` field means the source could not
/// supply it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetQuote {
    pub asset_id: String,
    pub currency: String,
    pub price: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub market_cap: Option<f64>,
}

impl AssetQuote {
    /// Current price, treating a missing or unusable value as blocking.
    pub fn require_price(&self) -> Result<f64> {
        require_positive(self.price, "price", &self.asset_id)
    }

    /// Circulating supply, treating a missing or unusable value as blocking.
    pub fn require_supply(&self) -> Result<f64> {
        require_positive(self.circulating_supply, "circulating supply", &self.asset_id)
    }
}

fn require_positive(value: Option<f64>, what: &str, asset_id: &str) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(v) => Err(anyhow!("Unusable {} for {}: {}", what, asset_id, v)),
        None => Err(anyhow!("{} unavailable for {}", capitalize(what), asset_id)),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_quote(&self, asset_id: &str, vs_currency: &str) -> Result<AssetQuote>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(price: Option<f64>, supply: Option<f64>) -> AssetQuote {
        AssetQuote {
            asset_id: "kaspa".to_string(),
            currency: "USD".to_string(),
            price,
            circulating_supply: supply,
            market_cap: None,
        }
    }

    #[test]
    fn test_unavailable_values_block() {
        let q = quote(None, Some(0.0));
        assert_eq!(
            q.require_price().unwrap_err().to_string(),
            "Price unavailable for kaspa"
        );
        assert_eq!(
            q.require_supply().unwrap_err().to_string(),
            "Unusable circulating supply for kaspa: 0"
        );
    }

    #[test]
    fn test_available_values_pass() {
        let q = quote(Some(0.12), Some(25e9));
        assert_eq!(q.require_price().unwrap(), 0.12);
        assert_eq!(q.require_supply().unwrap(), 25e9);
    }
}
