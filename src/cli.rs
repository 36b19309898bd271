//! CLI argument parsing and forge configuration.
use clap::{Parser, Subcommand};
use git_url_parse::{GitUrl, Scheme};
use secrecy::SecretString;

use crate::{
    MonoreleaseError, Result,
    forge::config::{
        DEFAULT_COMMIT_SEARCH_DEPTH, DEFAULT_GITHUB_API_URL, Remote,
        RemoteConfig,
    },
};

/// Global CLI arguments for forge configuration and debugging.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value = "", global = true)]
    /// GitHub repository URL (https://github.com/owner/repo).
    pub github_repo: String,

    #[arg(
        long,
        env = "GITHUB_TOKEN",
        default_value = "",
        hide_env_values = true,
        global = true
    )]
    /// GitHub access token. Falls back to the GITHUB_TOKEN env var.
    pub github_token: String,

    #[arg(long, global = true)]
    /// Branch releases are cut from. Defaults to the repository default
    /// branch.
    pub target_branch: Option<String>,

    #[arg(long, default_value_t = DEFAULT_COMMIT_SEARCH_DEPTH, global = true)]
    /// Max commits to walk when there is no previous release. Use 0 for full
    /// history.
    pub commit_search_depth: u64,

    #[arg(long, default_value_t = false, global = true)]
    /// Log forge mutations instead of performing them.
    pub dry_run: bool,

    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Release operation subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Analyze commits and open or update the release pull request.
    ReleasePr,

    /// Create releases for a merged release pull request.
    Release,
}

impl Args {
    /// Configure the remote repository connection from CLI arguments.
    pub fn get_remote(&self) -> Result<Remote> {
        let search_depth = match self.commit_search_depth {
            0 => u64::MAX,
            depth => depth,
        };

        if self.github_repo.is_empty() {
            return Err(MonoreleaseError::InvalidArgs(
                "must set --github-repo".into(),
            ));
        }

        let parsed = GitUrl::parse(&self.github_repo).map_err(|e| {
            MonoreleaseError::InvalidRemoteUrl(format!(
                "{}: {e}",
                self.github_repo
            ))
        })?;

        if !matches!(parsed.scheme, Scheme::Http | Scheme::Https) {
            return Err(MonoreleaseError::InvalidRemoteUrl(
                "only http and https schemes are supported for repo urls"
                    .into(),
            ));
        }

        let token = match self.github_token.as_str() {
            "" => parsed.token.clone().unwrap_or_default(),
            token => token.to_string(),
        };

        if token.is_empty() {
            return Err(MonoreleaseError::InvalidArgs(
                "must set --github-token or GITHUB_TOKEN".into(),
            ));
        }

        let host = parsed.host.clone().ok_or_else(|| {
            MonoreleaseError::InvalidRemoteUrl(
                "unable to parse host from github repo".into(),
            )
        })?;

        let owner = parsed.owner.clone().ok_or_else(|| {
            MonoreleaseError::InvalidRemoteUrl(
                "unable to parse owner from github repo".into(),
            )
        })?;

        let link_base_url = format!("{}://{}", parsed.scheme, host);

        // enterprise installations serve the API below the web host
        let api_url = match host.as_str() {
            "github.com" => DEFAULT_GITHUB_API_URL.to_string(),
            _ => format!("{link_base_url}/api/v3"),
        };

        let commit_link_base_url =
            format!("{link_base_url}/{owner}/{}/commit", parsed.name);

        Ok(Remote::Github(RemoteConfig {
            host,
            owner,
            repo: parsed.name,
            api_url,
            token: SecretString::from(token),
            commit_link_base_url,
            commit_search_depth: search_depth,
            dry_run: self.dry_run,
        }))
    }
}
