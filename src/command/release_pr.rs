//! Release pull request command implementation.
use log::*;

use crate::{Result, cli::Args, command::common};

/// Analyze commits since the last release and open, update or close release
/// pull requests.
pub async fn execute(args: &Args) -> Result<()> {
    let orchestrator = common::build_orchestrator(args).await?;

    let numbers = orchestrator.create_pull_requests().await?;

    if numbers.is_empty() {
        info!("no release pull request needed");
    }

    for number in numbers {
        info!("release pull request: #{number}");
    }

    Ok(())
}
