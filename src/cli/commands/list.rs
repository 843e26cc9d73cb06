//! List command - show stored key sets

use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::{Config, ConfigManager};
use crate::error::KeysetResult;
use crate::fingerprint::{Fingerprint, KeySetId};
use crate::store::encode;
use console::style;
use serde::Serialize;

/// Execute the list command
pub async fn execute(args: ListArgs, config: &Config) -> KeysetResult<()> {
    let store = ConfigManager::open_store(config).await?;
    let mut entries = store.entries().await?;
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    match args.format {
        OutputFormat::Table => print_table(store.namespace(), &entries),
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(namespace: &str, entries: &[(Fingerprint, KeySetId)]) {
    if entries.is_empty() {
        println!("No stored key sets in {}.", style(namespace).cyan());
        return;
    }

    println!("{:<48} {:<40}", "FINGERPRINT", "KEY SET ID");
    println!("{}", "-".repeat(88));

    for (fingerprint, key_set_id) in entries {
        println!(
            "{:<48} {:<40}",
            truncate(&encode(fingerprint.as_bytes()), 48),
            style(truncate(&key_set_id.to_string(), 40)).green()
        );
    }

    println!();
    println!("Total: {} key set(s)", entries.len());
}

fn print_json(entries: &[(Fingerprint, KeySetId)]) -> KeysetResult<()> {
    #[derive(Serialize)]
    struct EntryJson {
        fingerprint: String,
        fingerprint_hex: String,
        key_set_id: String,
    }

    let json: Vec<EntryJson> = entries
        .iter()
        .map(|(fp, ks)| EntryJson {
            fingerprint: encode(fp.as_bytes()),
            fingerprint_hex: fp.to_string(),
            key_set_id: encode(ks.as_bytes()),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_plain(entries: &[(Fingerprint, KeySetId)]) {
    for (fingerprint, key_set_id) in entries {
        println!(
            "{} {}",
            encode(fingerprint.as_bytes()),
            encode(key_set_id.as_bytes())
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
