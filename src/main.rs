use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sharps_edge::aggregator::OddsAggregator;
use sharps_edge::analysis::{analyze, AnalysisRequest};
use sharps_edge::config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sports betting edge detector: EV, Kelly and arbitrage against sharp lines.
#[derive(Parser, Debug)]
#[command(name = "sharps-edge")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve(ConfigArg),

    /// Analyze one game from American odds
    Analyze(AnalyzeArgs),

    /// Print aggregated upcoming games
    Upcoming(SportArgs),

    /// Run one aggregation cycle and print the count
    Sync(SportArgs),
}

#[derive(Args, Debug)]
struct ConfigArg {
    /// Path to configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    config: ConfigArg,

    /// Sharp book price (American)
    #[arg(long, allow_negative_numbers = true)]
    sharp: f64,

    /// Prediction-market price (American)
    #[arg(long, allow_negative_numbers = true)]
    pm: Option<f64>,

    /// Defaults to `analysis.default_bankroll`
    #[arg(long)]
    bankroll: Option<f64>,

    /// Override the sharp-implied win probability
    #[arg(long)]
    true_prob: Option<f64>,
}

#[derive(Args, Debug)]
struct SportArgs {
    #[command(flatten)]
    config: ConfigArg,

    /// Sport tag such as NBA or NFL; omit for every sport
    #[arg(long)]
    sport: Option<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(arg: &ConfigArg) -> Result<Config> {
    Config::load_or_default(&arg.config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sharps_edge=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Real env vars take precedence over .env
    Config::load_env_file();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(arg) => {
            let config = load_config(&arg)?;
            sharps_edge::server::serve(config).await?;
        }
        Commands::Analyze(args) => {
            let config = load_config(&args.config)?;
            let req = AnalysisRequest {
                sharp_odds: args.sharp,
                pm_odds: args.pm,
                bankroll: args.bankroll.unwrap_or(config.analysis.default_bankroll),
                true_probability: args.true_prob,
            };
            req.validate().context("invalid analysis input")?;
            print_json(&analyze(&req))?;
        }
        Commands::Upcoming(args) => {
            let config = load_config(&args.config)?;
            let aggregator = OddsAggregator::from_config(&config)?;
            let games = aggregator.get_upcoming_games(args.sport.as_deref()).await;
            print_json(&games)?;
        }
        Commands::Sync(args) => {
            let config = load_config(&args.config)?;
            let aggregator = OddsAggregator::from_config(&config)?;
            print_json(&aggregator.sync(args.sport.as_deref()).await)?;
        }
    }

    Ok(())
}
