//! Currex CLI entry point.
//!
//! With no subcommand it starts the interactive prompt; the
//! `update-rates` subcommand runs the updater headlessly, once or on an
//! interval.

mod repl;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use currex_core::config::Config;
use currex_core::services::update_service::UpdateSchedule;
use currex_core::TradeHub;

#[derive(Parser)]
#[command(name = "currex", about = "Currency wallets and trades against live exchange rates")]
struct Cli {
    /// Directory holding the JSON data stores (overrides CURREX_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh the rate cache from all configured sources
    UpdateRates {
        /// Keep updating forever, sleeping this many seconds between cycles
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    let hub = TradeHub::new(config);

    let result = match cli.command {
        Some(Command::UpdateRates { interval }) => match interval {
            Some(secs) => {
                println!("Updater running every {secs}s, press Ctrl+C to stop.");
                hub.run_scheduler(UpdateSchedule::Every(Duration::from_secs(secs)))
                    .await
            }
            None => hub.update_rates().await.map(|report| {
                println!(
                    "Updated {} rates ({} sources failed).",
                    report.updated, report.failed_adapters
                );
            }),
        },
        None => repl::run(&hub).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
