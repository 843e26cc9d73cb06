//! keyset-cache - offline license key-set cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use keyset_cache::cli::{Cli, Commands};
use keyset_cache::config::ConfigManager;
use keyset_cache::error::KeysetResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> KeysetResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = warn, 1 = info, 2+ = debug
    let verbosity = if config.general.verbose {
        cli.verbose.max(1)
    } else {
        cli.verbose
    };
    let filter = match verbosity {
        0 => EnvFilter::new("keyset_cache=warn"),
        1 => EnvFilter::new("keyset_cache=info"),
        _ => EnvFilter::new("keyset_cache=debug"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .without_time()
            .init();
    }

    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::List(args) => keyset_cache::cli::commands::list(args, &config).await,
        Commands::Get(args) => keyset_cache::cli::commands::get(args, &config).await,
        Commands::Remove(args) => keyset_cache::cli::commands::remove(args, &config).await,
        Commands::Clear(args) => keyset_cache::cli::commands::clear(args, &config).await,
        Commands::Check(args) => keyset_cache::cli::commands::check(args, &config).await,
        Commands::Config(args) => {
            keyset_cache::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
