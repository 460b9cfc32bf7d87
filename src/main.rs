//! Rihla - agent-driven travel planner
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rihla::cli::{commands, Cli, Commands};
use rihla::Config;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Loads .env as well, so credentials are visible afterwards
    let config = Config::load();

    match cli.command {
        Commands::Plan(args) => Ok(commands::plan(args, config).await?),
        Commands::Config { action } => {
            commands::config(action, &config)?;
            Ok(true)
        }
    }
}
