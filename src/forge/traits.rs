//! Traits related to remote git forges
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::{
    Result,
    forge::{
        config::RemoteConfig,
        request::{
            CreatePrRequest, CreateReleaseRequest, ForgeCommit,
            GetFileContentRequest, ListCommitsRequest, PrLabelsRequest,
            PullRequest, Release, UpdatePrRequest,
        },
    },
};

/// Narrow contract the orchestrator needs from a hosting platform.
/// Implementations own pagination and transient retries.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Forge {
    fn repo_name(&self) -> String;
    fn remote_config(&self) -> RemoteConfig;
    fn default_branch(&self) -> String;

    /// `Ok(None)` when the file does not exist at the requested ref
    async fn get_file_content(
        &self,
        req: GetFileContentRequest,
    ) -> Result<Option<String>>;

    /// Newest first
    async fn list_commits(
        &self,
        req: ListCommitsRequest,
    ) -> Result<Vec<ForgeCommit>>;

    /// Merged pull requests targeting `base_branch`, most recently merged
    /// first
    async fn list_merged_pull_requests(
        &self,
        base_branch: &str,
    ) -> Result<Vec<PullRequest>>;

    async fn list_open_pull_requests(
        &self,
        base_branch: &str,
    ) -> Result<Vec<PullRequest>>;

    async fn get_pull_request_files(&self, pr_number: u64)
    -> Result<Vec<String>>;

    async fn create_pull_request(
        &self,
        req: CreatePrRequest,
    ) -> Result<PullRequest>;

    async fn update_pull_request(&self, req: UpdatePrRequest) -> Result<()>;

    async fn close_pull_request(&self, pr_number: u64) -> Result<()>;

    /// Must fail with `MonoreleaseError::DuplicateRelease` when the tag
    /// already has a release
    async fn create_release(&self, req: CreateReleaseRequest)
    -> Result<Release>;

    async fn add_labels(&self, req: PrLabelsRequest) -> Result<()>;

    async fn remove_labels(&self, req: PrLabelsRequest) -> Result<()>;

    async fn comment_on_issue(&self, issue_number: u64, body: &str)
    -> Result<()>;
}
