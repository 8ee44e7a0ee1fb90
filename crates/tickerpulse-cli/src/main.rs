mod collect;
mod report;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tickerpulse")]
#[command(about = "Daily news sentiment for a universe of stock tickers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect articles, score sentiment and update today's cache records
    Collect {
        /// Restrict collection to one ticker symbol
        #[arg(long)]
        symbol: Option<String>,

        /// Print the stocks and sources that would run without fetching anything
        #[arg(long)]
        dry_run: bool,

        /// Write the CSV report to this path instead of stdout
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Show today's cached snapshots and sentiment summaries
    Status {
        /// Filter to one ticker symbol
        #[arg(long)]
        symbol: Option<String>,
    },
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = tickerpulse_core::load_app_config()?;
    init_tracing(&config.log_level);

    match cli.command {
        Some(Commands::Collect {
            symbol,
            dry_run,
            report,
        }) => {
            collect::run_collect(&config, symbol.as_deref(), dry_run, report.as_deref()).await?;
        }
        Some(Commands::Status { symbol }) => {
            status::run_status(&config, symbol.as_deref()).await?;
        }
        None => println!("no command given; try `tickerpulse collect` or `tickerpulse --help`"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
