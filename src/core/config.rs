use crate::core::currency::Currency;
use crate::core::facts::DEFAULT_TARGET_VALUE;
use crate::core::grid::GridOptions;
use crate::core::input::{IntervalSpec, SpacingMode};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PortfolioConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// CoinGecko id of the held asset
    #[serde(default = "default_asset")]
    pub asset: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    pub holdings: f64,
    /// Fixed price, skips fetching it
    pub price: Option<f64>,
    /// Fixed circulating supply (in coins), skips fetching it
    pub circulating_supply: Option<f64>,
}

fn default_asset() -> String {
    "kaspa".to_string()
}

fn default_symbol() -> String {
    "KAS".to_string()
}

/// An interval bound, either a fixed price or a multiple of the base price.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum BoundConfig {
    Price(f64),
    Relative { base_multiple: f64 },
}

impl BoundConfig {
    pub fn resolve(&self, base_price: f64) -> f64 {
        match self {
            BoundConfig::Price(price) => *price,
            BoundConfig::Relative { base_multiple } => base_price * base_multiple,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IntervalRule {
    pub mode: SpacingMode,
    pub steps: usize,
    pub lower: BoundConfig,
    pub upper: BoundConfig,
}

impl IntervalRule {
    /// Bounds are resolved against the base price but not validated here;
    /// the grid generator rejects bad ranges.
    pub fn resolve(&self, base_price: f64) -> IntervalSpec {
        IntervalSpec {
            mode: self.mode,
            step_count: self.steps,
            lower_bound: self.lower.resolve(base_price),
            upper_bound: self.upper.resolve(base_price),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GridConfig {
    #[serde(default = "default_include_base")]
    pub include_base: bool,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default = "default_intervals")]
    pub intervals: Vec<IntervalRule>,
}

fn default_include_base() -> bool {
    true
}

/// Linear below the base price, logarithmic above it. The fixed ceiling of
/// 1000 means assets priced above it need their own intervals.
fn default_intervals() -> Vec<IntervalRule> {
    vec![
        IntervalRule {
            mode: SpacingMode::Linear,
            steps: 9,
            lower: BoundConfig::Price(0.01),
            upper: BoundConfig::Relative { base_multiple: 1.0 },
        },
        IntervalRule {
            mode: SpacingMode::Logarithmic,
            steps: 240,
            lower: BoundConfig::Relative { base_multiple: 1.0 },
            upper: BoundConfig::Price(1000.0),
        },
    ]
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            include_base: default_include_base(),
            decimals: None,
            intervals: default_intervals(),
        }
    }
}

impl GridConfig {
    pub fn options(&self) -> GridOptions {
        GridOptions {
            include_base: self.include_base,
            decimals: self.decimals,
        }
    }

    pub fn resolve_intervals(&self, base_price: f64) -> Vec<IntervalSpec> {
        self.intervals
            .iter()
            .map(|rule| rule.resolve(base_price))
            .collect()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoProviderConfig {
    pub base_url: String,
    #[serde(default = "default_retries")]
    pub retries: usize,
}

fn default_retries() -> usize {
    2
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub coingecko: Option<CoinGeckoProviderConfig>,
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coingecko: Some(CoinGeckoProviderConfig {
                base_url: "https://api.coingecko.com/api/v3".to_string(),
                retries: default_retries(),
            }),
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub portfolio: PortfolioConfig,
    /// Currency the projection is computed in
    #[serde(default)]
    pub base_currency: Currency,
    /// Currency the projection is displayed in
    #[serde(default)]
    pub currency: Currency,
    #[serde(default = "default_reference_asset")]
    pub reference_asset: Option<String>,
    pub reference_market_cap: Option<f64>,
    #[serde(default = "default_target_value")]
    pub target_value: f64,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Fallback base-to-target rates, used only when fetching a rate fails
    #[serde(default)]
    pub exchange_rates: HashMap<Currency, f64>,
}

fn default_reference_asset() -> Option<String> {
    Some("bitcoin".to_string())
}

fn default_target_value() -> f64 {
    DEFAULT_TARGET_VALUE
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "kpp", "kpp")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
