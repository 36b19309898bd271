//! Release command implementation.
use log::*;

use crate::{Result, cli::Args, command::common};

/// Create forge releases for the merged release pull request.
pub async fn execute(args: &Args) -> Result<()> {
    let orchestrator = common::build_orchestrator(args).await?;

    let releases = orchestrator.create_releases().await?;

    for release in releases {
        info!("released {}: {}", release.tag, release.url);
    }

    Ok(())
}
