pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{AssetQuote, Currency, SortColumn};
use crate::providers::Cache;
use crate::providers::coingecko::CoinGeckoProvider;
use crate::providers::yahoo_finance::YahooCurrencyProvider;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com";
const QUOTE_TTL: Duration = Duration::from_secs(60);
const RETRY_DELAY_MS: u64 = 500;

/// Command line overrides for a projection run.
#[derive(Debug, Clone, Default)]
pub struct ProjectionOptions {
    pub holdings: Option<f64>,
    pub price: Option<f64>,
    pub supply: Option<f64>,
    pub currency: Option<Currency>,
    pub sort: Option<SortColumn>,
    pub descending: bool,
    /// Never touch the network; all inputs must come from flags or config.
    pub offline: bool,
}

#[derive(Debug, Clone)]
pub enum AppCommand {
    Project(ProjectionOptions),
    Export {
        options: ProjectionOptions,
        output: PathBuf,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("kpp starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let quote_cache = Arc::new(Cache::<String, AssetQuote>::with_ttl(QUOTE_TTL));
    let rate_cache = Arc::new(Cache::<String, f64>::with_ttl(QUOTE_TTL));

    let (coingecko_url, retries) = config
        .providers
        .coingecko
        .as_ref()
        .map_or((DEFAULT_COINGECKO_URL, 2), |p| (p.base_url.as_str(), p.retries));
    let market_provider = CoinGeckoProvider::new(coingecko_url, Arc::clone(&quote_cache))
        .with_retries(retries, RETRY_DELAY_MS);

    let yahoo_url = config
        .providers
        .yahoo
        .as_ref()
        .map_or(DEFAULT_YAHOO_URL, |p| &p.base_url);
    let rate_provider = YahooCurrencyProvider::new(yahoo_url, Arc::clone(&rate_cache));

    match command {
        AppCommand::Project(options) => {
            cli::project::run(&config, &options, &market_provider, &rate_provider).await
        }
        AppCommand::Export { options, output } => {
            let projection =
                cli::project::prepare(&config, &options, &market_provider, &rate_provider).await?;
            cli::export::export_to_path(&projection, &output)?;
            println!(
                "Exported {} rows to {}",
                projection.table.len(),
                output.display()
            );
            Ok(())
        }
    }
}
