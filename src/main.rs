use anyhow::Result;
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use kpp::core::log::init_logging;
use kpp::{AppCommand, ProjectionOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging (-vv for trace output)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ProjectArgs {
    /// Amount of coins held, overrides the config
    #[arg(long)]
    holdings: Option<f64>,

    /// Current price in the base currency, skips fetching it
    #[arg(long)]
    price: Option<f64>,

    /// Circulating supply, skips fetching it
    #[arg(long)]
    supply: Option<f64>,

    /// Display currency (USD, EUR, GBP, JPY, AUD)
    #[arg(long)]
    currency: Option<String>,

    /// Sort column (price, value, market-cap, change, ratio)
    #[arg(long)]
    sort: Option<String>,

    /// Sort in descending order
    #[arg(long)]
    desc: bool,

    /// Do not fetch market data or exchange rates
    #[arg(long)]
    offline: bool,
}

impl TryFrom<ProjectArgs> for ProjectionOptions {
    type Error = anyhow::Error;

    fn try_from(args: ProjectArgs) -> Result<Self> {
        Ok(ProjectionOptions {
            holdings: args.holdings,
            price: args.price,
            supply: args.supply,
            currency: args.currency.as_deref().map(str::parse).transpose()?,
            sort: args.sort.as_deref().map(str::parse).transpose()?,
            descending: args.desc,
            offline: args.offline,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the projection table
    Project(ProjectArgs),
    /// Write the projection table to a CSV file
    Export {
        #[command(flatten)]
        args: ProjectArgs,

        /// Destination CSV file
        #[arg(short, long)]
        output: PathBuf,
    },
}

impl TryFrom<Commands> for AppCommand {
    type Error = anyhow::Error;

    fn try_from(cmd: Commands) -> Result<Self> {
        match cmd {
            Commands::Project(args) => Ok(AppCommand::Project(args.try_into()?)),
            Commands::Export { args, output } => Ok(AppCommand::Export {
                options: args.try_into()?,
                output,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => kpp::cli::setup::setup(),
        Some(cmd) => match AppCommand::try_from(cmd) {
            Ok(command) => kpp::run_command(command, cli.config_path.as_deref()).await,
            Err(e) => Err(e),
        },
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
