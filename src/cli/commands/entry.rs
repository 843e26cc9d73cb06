//! Get and remove commands - operate on a single fingerprint

use crate::cli::args::FingerprintArgs;
use crate::config::{Config, ConfigManager};
use crate::error::{KeysetError, KeysetResult};
use crate::fingerprint::Fingerprint;
use crate::store::{decode, encode};
use console::style;

/// Parse a fingerprint given as stored base64 or as `hex:<digits>`.
/// An empty argument (or bare `hex:`) names the empty fingerprint.
pub fn parse_fingerprint(arg: &str) -> KeysetResult<Fingerprint> {
    let bytes = match arg.strip_prefix("hex:") {
        Some(digits) => {
            hex::decode(digits).map_err(|e| KeysetError::FingerprintArg(format!("{arg}: {e}")))?
        }
        None => decode(arg).map_err(|_| KeysetError::FingerprintArg(arg.to_string()))?,
    };

    Ok(Fingerprint::new(bytes))
}

/// Execute the get command
pub async fn get(args: FingerprintArgs, config: &Config) -> KeysetResult<()> {
    let fingerprint = parse_fingerprint(&args.fingerprint)?;
    let store = ConfigManager::open_store(config).await?;

    match store.get(&fingerprint).await {
        Some(key_set_id) => {
            println!("{}", encode(key_set_id.as_bytes()));
            Ok(())
        }
        None => Err(KeysetError::User(format!(
            "No key set stored for {}",
            fingerprint
        ))),
    }
}

/// Execute the remove command
pub async fn remove(args: FingerprintArgs, config: &Config) -> KeysetResult<()> {
    let fingerprint = parse_fingerprint(&args.fingerprint)?;
    let store = ConfigManager::open_store(config).await?;

    store.remove(&fingerprint).await?;

    println!(
        "{} Removed key set for {}",
        style("✓").green(),
        style(&args.fingerprint).cyan()
    );
    Ok(())
}
