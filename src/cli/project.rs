use super::ui;
use crate::ProjectionOptions;
use crate::core::config::AppConfig;
use crate::core::{
    AssetQuote, Currency, CurrencyRateProvider, MarketDataProvider, PortfolioFacts,
    PortfolioInput, ProjectionSession, ProjectionTable,
};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local};
use comfy_table::Cell;
use tracing::{debug, info, warn};

/// A built projection, ready to be shown or exported.
pub struct Projection {
    pub name: String,
    pub symbol: String,
    pub reference_asset: Option<String>,
    pub facts: PortfolioFacts,
    pub table: ProjectionTable,
    pub generated_at: DateTime<Local>,
}

/// Resolves inputs from flags, config and the market data providers, then
/// runs the engine and applies the requested view.
pub async fn prepare(
    config: &AppConfig,
    options: &ProjectionOptions,
    market_provider: &(dyn MarketDataProvider + Send + Sync),
    rate_provider: &(dyn CurrencyRateProvider + Send + Sync),
) -> Result<Projection> {
    let portfolio = &config.portfolio;
    let base_currency = config.base_currency;
    let vs_currency = base_currency.code();

    let holdings = options.holdings.unwrap_or(portfolio.holdings);
    let price_override = options.price.or(portfolio.price);
    let supply_override = options.supply.or(portfolio.circulating_supply);
    let needs_quote = price_override.is_none() || supply_override.is_none();
    let reference_asset = config
        .reference_asset
        .as_deref()
        .filter(|_| config.reference_market_cap.is_none());

    let (quote, reference_quote) = if options.offline {
        debug!("Offline mode, skipping market data fetch");
        (None, None)
    } else {
        let pb = ui::new_spinner("Fetching market data...");
        let quote_future = async {
            if needs_quote {
                Some(market_provider.fetch_quote(&portfolio.asset, vs_currency).await)
            } else {
                None
            }
        };
        let reference_future = async {
            match reference_asset {
                Some(asset) => Some(market_provider.fetch_quote(asset, vs_currency).await),
                None => None,
            }
        };
        let (quote, reference_quote) = futures::join!(quote_future, reference_future);
        pb.finish_and_clear();
        (quote, reference_quote)
    };

    let quote = quote
        .transpose()
        .with_context(|| format!("Failed to fetch market data for {}", portfolio.asset))?;
    let base_price = match price_override {
        Some(price) => price,
        None => require_from_quote(quote.as_ref(), &portfolio.asset, AssetQuote::require_price)?,
    };
    let circulating_supply = match supply_override {
        Some(supply) => supply,
        None => {
            require_from_quote(quote.as_ref(), &portfolio.asset, AssetQuote::require_supply)?
        }
    };

    let reference_market_cap = match (config.reference_market_cap, reference_quote) {
        (Some(cap), _) => Some(cap),
        (None, Some(Ok(q))) => {
            if q.market_cap.is_none() {
                warn!(asset = %q.asset_id, "Reference market cap unavailable");
            }
            q.market_cap
        }
        (None, Some(Err(e))) => {
            warn!(error = %e, "Failed to fetch reference market data, ratio column left empty");
            None
        }
        (None, None) => None,
    };

    let input = PortfolioInput::new(holdings, base_price, circulating_supply, base_currency)?;
    let session = ProjectionSession {
        input,
        intervals: config.grid.resolve_intervals(base_price),
        grid_options: config.grid.options(),
        reference_market_cap,
    };
    let table = session.build_table()?;
    let facts = session.facts(config.target_value)?;

    let display_currency = options.currency.unwrap_or(config.currency);
    let rate = resolve_rate(config, rate_provider, display_currency, options.offline).await?;
    let mut view = table.with_currency(display_currency, rate)?;
    if let Some(column) = options.sort {
        view.sort_by(column, !options.descending);
    }

    info!(
        rows = view.len(),
        currency = %display_currency,
        rate,
        "Projection ready"
    );
    Ok(Projection {
        name: portfolio
            .name
            .clone()
            .unwrap_or_else(|| "Unnamed".to_string()),
        symbol: portfolio.symbol.clone(),
        reference_asset: config.reference_asset.clone(),
        facts: facts.converted(rate)?,
        table: view,
        generated_at: Local::now(),
    })
}

fn require_from_quote(
    quote: Option<&AssetQuote>,
    asset: &str,
    require: fn(&AssetQuote) -> Result<f64>,
) -> Result<f64> {
    match quote {
        Some(q) => require(q),
        None => Err(anyhow!(
            "Market data unavailable for {asset}; set it in the config or pass it on the command line"
        )),
    }
}

/// Base-to-display rate: fetched first, the configured table as fallback.
async fn resolve_rate(
    config: &AppConfig,
    rate_provider: &(dyn CurrencyRateProvider + Send + Sync),
    target: Currency,
    offline: bool,
) -> Result<f64> {
    let base = config.base_currency;
    if base == target {
        return Ok(1.0);
    }

    let fetched = if offline {
        None
    } else {
        match rate_provider.get_rate(base.code(), target.code()).await {
            Ok(rate) => Some(rate),
            Err(e) => {
                warn!(error = %e, from = %base, to = %target, "Exchange rate fetch failed");
                None
            }
        }
    };

    match (fetched, config.exchange_rates.get(&target)) {
        (Some(rate), _) => Ok(rate),
        (None, Some(rate)) => {
            warn!(from = %base, to = %target, rate, "Using configured fallback exchange rate");
            Ok(*rate)
        }
        (None, None) => Err(anyhow!("Exchange rate unavailable for {base} to {target}")),
    }
}

impl Projection {
    pub fn display_facts(&self) -> String {
        let facts = &self.facts;
        let currency = self.table.currency();
        let symbol = &self.symbol;

        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);
        let na = || "N/A".to_string();
        let lines = [
            (format!("Current {symbol} Price"), ui::price(facts.price, currency)),
            (
                format!("Current {symbol} Holdings"),
                format!("{} {symbol}", ui::group_thousands(facts.holdings, 2)),
            ),
            (
                format!("Current {symbol} Portfolio Value"),
                ui::money(facts.portfolio_value, currency, 2),
            ),
            (
                format!("Current {symbol} Market Cap"),
                ui::money(facts.market_cap, currency, 2),
            ),
            (
                format!(
                    "{symbol} Price Needed for {}",
                    ui::money(facts.target_value, currency, 0)
                ),
                facts
                    .price_for_target
                    .map_or_else(na, |p| ui::money(p, currency, 2)),
            ),
            (
                format!(
                    "{symbol} Market Cap Needed for {}",
                    ui::money(facts.target_value, currency, 0)
                ),
                facts
                    .market_cap_for_target
                    .map_or_else(na, |c| ui::money(c, currency, 2)),
            ),
        ];
        for (label, value) in lines {
            table.add_row(vec![
                Cell::new(label),
                Cell::new(value).set_alignment(comfy_table::CellAlignment::Right),
            ]);
        }

        let mut output = format!(
            "{} {}\n{}\n\n",
            ui::style_text("Portfolio:", ui::StyleType::Label),
            ui::style_text(&self.name, ui::StyleType::Title),
            ui::style_text(
                &format!("Generated {}", self.generated_at.format("%B %d, %Y")),
                ui::StyleType::Subtle
            )
        );
        output.push_str(&table.to_string());
        output.push_str("\n\n");
        output.push_str(&self.comparison_sentence());
        output
    }

    fn comparison_sentence(&self) -> String {
        let facts = &self.facts;
        let currency = self.table.currency();
        let reference = self.reference_asset.as_deref().unwrap_or("reference asset");
        match (
            facts.market_cap_for_target,
            facts.target_cap_ratio,
            facts.reference_market_cap,
        ) {
            (Some(cap), Some(ratio), Some(reference_cap)) => format!(
                "A {} portfolio would require a {} price of {} and a market cap of {}, about {} times the current {} market cap of {}.",
                ui::money(facts.target_value, currency, 0),
                self.symbol,
                facts
                    .price_for_target
                    .map_or_else(|| "N/A".to_string(), |p| ui::money(p, currency, 2)),
                ui::money(cap, currency, 0),
                ui::style_text(&format!("{ratio:.4}"), ui::StyleType::Value),
                reference,
                ui::money(reference_cap, currency, 0),
            ),
            (None, _, _) => ui::style_text(
                "Holdings are zero, no target price can be derived.",
                ui::StyleType::Error,
            ),
            _ => ui::style_text(
                &format!("{reference} market cap data unavailable."),
                ui::StyleType::Error,
            ),
        }
    }

    pub fn display_table(&self) -> String {
        let currency = self.table.currency();
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell(&format!("Price ({currency})")),
            ui::header_cell(&format!("Portfolio Value ({currency})")),
            ui::header_cell(&format!("Market Cap ({currency})")),
            ui::header_cell("Change"),
            ui::header_cell("Cap Ratio"),
        ]);

        for row in self.table.rows() {
            table.add_row(vec![
                ui::zone_cell(ui::price(row.price, currency), row.zone),
                ui::zone_cell(ui::money(row.portfolio_value, currency, 0), row.zone),
                ui::zone_cell(ui::money(row.market_cap, currency, 0), row.zone),
                ui::zone_cell(ui::percent(row.pct_change_from_base), row.zone),
                ui::format_optional_cell(row.market_cap_ratio, |r| format!("{r:.4}x")),
            ]);
        }
        table.to_string()
    }
}

pub async fn run(
    config: &AppConfig,
    options: &ProjectionOptions,
    market_provider: &(dyn MarketDataProvider + Send + Sync),
    rate_provider: &(dyn CurrencyRateProvider + Send + Sync),
) -> Result<()> {
    let projection = prepare(config, options, market_provider, rate_provider).await?;

    println!("{}", projection.display_facts());
    ui::print_separator();
    println!("{}", projection.display_table());
    if let Some(position) = projection.table.base_row_position() {
        println!(
            "{}",
            ui::style_text(
                &format!(
                    "Current price is row {} of {}",
                    position + 1,
                    projection.table.len()
                ),
                ui::StyleType::Subtle
            )
        );
    }
    Ok(())
}
