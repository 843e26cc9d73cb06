//! Clear command - remove every stored key set

use crate::cli::args::ClearArgs;
use crate::config::{Config, ConfigManager};
use crate::error::KeysetResult;
use console::style;
use std::io::{self, Write};

/// Execute the clear command
pub async fn execute(args: ClearArgs, config: &Config) -> KeysetResult<()> {
    let store = ConfigManager::open_store(config).await?;
    let entries = store.entries().await?;

    if entries.is_empty() {
        println!("No stored key sets to clear.");
        return Ok(());
    }

    println!(
        "This will remove {} key set(s) from {}.",
        entries.len(),
        style(store.namespace()).cyan()
    );
    println!();

    if !args.yes {
        print!("Are you sure? [y/N] ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            println!("Failed to read input, aborting.");
            return Ok(());
        }

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = store.clear().await?;
    println!("{} cleared {} key set(s)", style("✓").green(), removed);

    Ok(())
}
