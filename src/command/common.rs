//! Common functionality shared between release commands
use log::*;
use std::rc::Rc;

use crate::{
    MonoreleaseError, Orchestrator, Result,
    cli::Args,
    config::{Config, DEFAULT_CONFIG_FILE, resolver::ConfigResolverBuilder},
    forge::{manager::ForgeManager, request::GetFileContentRequest},
};

/// Connects to the forge, loads `monorelease-config.json` from the target
/// branch and builds the orchestrator
pub async fn build_orchestrator(args: &Args) -> Result<Orchestrator> {
    let remote = args.get_remote()?;
    let forge = Rc::new(ForgeManager::new(remote.get_forge().await?));

    let target_branch = args
        .target_branch
        .clone()
        .unwrap_or_else(|| forge.default_branch());

    debug!("loading {DEFAULT_CONFIG_FILE} from {target_branch}");

    let content = forge
        .get_file_content(GetFileContentRequest {
            git_ref: Some(target_branch.clone()),
            path: DEFAULT_CONFIG_FILE.to_string(),
        })
        .await?
        .ok_or_else(|| {
            MonoreleaseError::invalid_config(format!(
                "{DEFAULT_CONFIG_FILE} not found on {target_branch}"
            ))
        })?;

    let config = ConfigResolverBuilder::default()
        .config(Config::parse(&content)?)
        .repo_name(forge.repo_name())
        .build()
        .map_err(|e| MonoreleaseError::invalid_config(e.to_string()))?
        .resolve()?;

    info!(
        "releasing {} package(s) from {target_branch}",
        config.packages.len()
    );

    Orchestrator::builder()
        .config(Rc::new(config))
        .forge(forge)
        .target_branch(target_branch)
        .build()
}
