use std::time::Duration;

use clap::{Parser, Subcommand};

mod commands;
mod report;

use commands::{SimulateArgs, WatchArgs};

#[derive(Parser)]
#[command(name = "survival")]
#[command(about = "Monte Carlo survivability and risk-of-ruin engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and print the report
    Simulate(SimulateArgs),
    /// Recompute periodically from the config profile, reloading on edits
    Watch(WatchArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async {
        match cli.command {
            Commands::Simulate(args) => commands::run_simulate(args).await,
            Commands::Watch(args) => commands::run_watch(args).await,
        }
    });

    // The config watcher parks a blocking thread until its next file event.
    runtime.shutdown_timeout(Duration::from_secs(1));

    result
}
