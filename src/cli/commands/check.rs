//! Check command - evaluate the renewal policy

use crate::cli::args::CheckArgs;
use crate::config::Config;
use crate::error::KeysetResult;
use crate::renewal::{RenewalDecision, RenewalPolicy};
use console::style;

/// Execute the check command
pub async fn execute(args: CheckArgs, config: &Config) -> KeysetResult<()> {
    let policy = RenewalPolicy::with_threshold(config.renewal.threshold_secs);
    let decision = policy.decide(args.playback, args.license);

    let label = match decision {
        RenewalDecision::Reuse => style(decision.to_string()).green(),
        RenewalDecision::Renew => style(decision.to_string()).yellow(),
    };

    println!(
        "{} (playback {}s, license {}s, threshold {}s)",
        label,
        args.playback,
        args.license,
        policy.threshold_secs()
    );

    Ok(())
}
