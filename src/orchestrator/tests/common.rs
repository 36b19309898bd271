//! Common test utilities for orchestrator tests.

use std::{collections::HashMap, rc::Rc};

use crate::{
    Orchestrator,
    config::{
        Config, DEFAULT_MANIFEST_FILE,
        resolver::{ConfigResolverBuilder, ResolvedConfig},
    },
    forge::{
        manager::ForgeManager,
        request::{ForgeCommit, PullRequest},
        traits::MockForge,
    },
    test_helpers::{create_test_pull_request, create_test_remote_config},
};

pub use crate::forge::config::{PENDING_LABEL, TAGGED_LABEL};

/// Resolves a config written as JSON for the `acme/repo` repository
pub fn resolve_config(json: &str) -> ResolvedConfig {
    let config = Config::parse(json).unwrap();

    ConfigResolverBuilder::default()
        .config(config)
        .repo_name("repo")
        .build()
        .unwrap()
        .resolve()
        .unwrap()
}

/// Manifest file content for the given `(path, version)` entries
pub fn manifest(entries: &[(&str, &str)]) -> String {
    let map = entries
        .iter()
        .map(|(path, version)| {
            (path.to_string(), serde_json::Value::String(version.to_string()))
        })
        .collect::<serde_json::Map<String, serde_json::Value>>();

    serde_json::to_string_pretty(&map).unwrap()
}

/// Repository state served by a mock forge. Only read methods are mocked so
/// any unexpected mutation fails the test.
#[derive(Default, Clone)]
pub struct Fixture {
    /// File content by path, the same at every ref
    pub files: HashMap<String, String>,
    pub commits: Vec<ForgeCommit>,
    pub merged: Vec<PullRequest>,
    pub open: Vec<PullRequest>,
    pub pull_request_files: Vec<String>,
}

impl Fixture {
    pub fn with_manifest(entries: &[(&str, &str)]) -> Self {
        let mut fixture = Self::default();
        fixture
            .files
            .insert(DEFAULT_MANIFEST_FILE.to_string(), manifest(entries));
        fixture
    }

    pub fn mock(&self) -> MockForge {
        let mut mock = MockForge::new();

        mock.expect_remote_config()
            .returning(create_test_remote_config);

        let files = self.files.clone();
        mock.expect_get_file_content()
            .returning(move |req| Ok(files.get(&req.path).cloned()));

        let commits = self.commits.clone();
        mock.expect_list_commits()
            .returning(move |_| Ok(commits.clone()));

        let merged = self.merged.clone();
        mock.expect_list_merged_pull_requests()
            .returning(move |_| Ok(merged.clone()));

        let open = self.open.clone();
        mock.expect_list_open_pull_requests()
            .returning(move |_| Ok(open.clone()));

        let pr_files = self.pull_request_files.clone();
        mock.expect_get_pull_request_files()
            .returning(move |_| Ok(pr_files.clone()));

        mock
    }
}

/// Orchestrator for the `main` branch of `acme/repo`
pub fn create_test_orchestrator(
    mock_forge: MockForge,
    config: ResolvedConfig,
) -> Orchestrator {
    let forge = Rc::new(ForgeManager::new(Box::new(mock_forge)));

    Orchestrator::builder()
        .config(Rc::new(config))
        .forge(forge)
        .target_branch("main")
        .build()
        .unwrap()
}

/// Merged release pull request with the given labels
pub fn merged_pull_request(
    number: u64,
    head_branch: &str,
    labels: &[&str],
    body: &str,
) -> PullRequest {
    PullRequest {
        body: body.to_string(),
        merge_commit_sha: Some("abc1234".to_string()),
        ..create_test_pull_request(number, head_branch, labels)
    }
}
