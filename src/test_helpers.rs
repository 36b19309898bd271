//! Common test helper functions shared across test modules.
//!
//! Provides fixtures for commits, packages and remote configuration so each
//! suite can focus on the behavior under test.
use secrecy::SecretString;

use crate::{
    config::{
        package::{PackageConfig, PackageConfigBuilder},
        release_type::ReleaseType,
    },
    forge::{
        config::RemoteConfig,
        request::{ForgeCommit, PullRequest},
    },
};

pub const TEST_REPO_URL: &str = "https://github.com/acme/repo";

/// Commit touching the given files. The short id is the first 8 characters
/// of `id`.
pub fn commit_with_files(
    id: &str,
    message: &str,
    files: &[&str],
) -> ForgeCommit {
    ForgeCommit {
        id: id.to_string(),
        short_id: id.chars().take(8).collect(),
        link: format!("{TEST_REPO_URL}/commit/{id}"),
        message: message.to_string(),
        timestamp: 1_700_000_000,
        files: files.iter().map(|f| f.to_string()).collect(),
    }
}

/// Commit without file information
pub fn commit(id: &str, message: &str) -> ForgeCommit {
    commit_with_files(id, message, &[])
}

/// Creates a test RemoteConfig for `acme/repo` on github.com
pub fn create_test_remote_config() -> RemoteConfig {
    RemoteConfig {
        host: "github.com".to_string(),
        owner: "acme".to_string(),
        repo: "repo".to_string(),
        token: SecretString::from("test-token".to_string()),
        commit_link_base_url: format!("{TEST_REPO_URL}/commit"),
        ..RemoteConfig::default()
    }
}

/// Multi-package style config: component in tags, generic release type
pub fn create_test_package(path: &str, component: &str) -> PackageConfig {
    PackageConfigBuilder::default()
        .path(path)
        .component(component)
        .release_type(ReleaseType::Generic)
        .include_component_in_tag(true)
        .build()
        .unwrap()
}

/// Pull request fixture with the given head branch and labels
pub fn create_test_pull_request(
    number: u64,
    head_branch: &str,
    labels: &[&str],
) -> PullRequest {
    PullRequest {
        number,
        head_branch: head_branch.to_string(),
        base_branch: "main".to_string(),
        title: "chore(main): release main".to_string(),
        body: "".to_string(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        merge_commit_sha: None,
    }
}
