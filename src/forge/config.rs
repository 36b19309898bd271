//! Configuration for Git forge platform connections.
use secrecy::SecretString;

use crate::{
    Result,
    forge::{github::Github, traits::Forge},
};

/// Default GitHub REST API endpoint.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
/// Default number of commits to search when no previous release exists.
pub const DEFAULT_COMMIT_SEARCH_DEPTH: u64 = 400;
/// Default page size for paginated queries
pub const DEFAULT_PAGE_SIZE: u8 = 100;
/// Number of attempts made for transient (5xx) failures.
pub const MAX_TRANSIENT_ATTEMPTS: u32 = 3;
/// Label applied to release PRs while waiting for merge / release.
pub const PENDING_LABEL: &str = "autorelease: pending";
/// Label applied to release PRs after every release has been created.
pub const TAGGED_LABEL: &str = "autorelease: tagged";

/// Remote repository connection configuration handed to forges at
/// construction.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Remote forge host (e.g., "github.com").
    pub host: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// REST API base url (differs for enterprise installations)
    pub api_url: String,
    /// Access token for authentication.
    pub token: SecretString,
    /// Base URL for commit links in changelog.
    pub commit_link_base_url: String,
    /// Max commits to walk when there is no previous release
    pub commit_search_depth: u64,
    /// Log mutations instead of performing them
    pub dry_run: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "".to_string(),
            owner: "".to_string(),
            repo: "".to_string(),
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            token: SecretString::from("".to_string()),
            commit_link_base_url: "".to_string(),
            commit_search_depth: DEFAULT_COMMIT_SEARCH_DEPTH,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone)]
/// Supported Git forge platforms.
pub enum Remote {
    Github(RemoteConfig),
}

impl Remote {
    /// Create forge client instance for the configured platform.
    pub async fn get_forge(&self) -> Result<Box<dyn Forge>> {
        match self {
            Remote::Github(config) => {
                let forge = Github::new(config.clone()).await?;
                Ok(Box::new(forge))
            }
        }
    }
}
