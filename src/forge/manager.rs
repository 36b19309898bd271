//! Manager that wraps forge implementations
use log::*;

use crate::{
    Result,
    forge::{
        config::RemoteConfig,
        request::{
            CreatePrRequest, CreateReleaseRequest, ForgeCommit,
            GetFileContentRequest, ListCommitsRequest, PrLabelsRequest,
            PullRequest, Release, UpdatePrRequest,
        },
        traits::Forge,
    },
};

/// Wraps a forge with dry-run handling and the predicate based lookups the
/// orchestrator needs. Reads always reach the forge; mutations are logged and
/// skipped when `dry_run` is set.
pub struct ForgeManager {
    forge: Box<dyn Forge>,
    remote_config: RemoteConfig,
}

impl ForgeManager {
    pub fn new(forge: Box<dyn Forge>) -> Self {
        let remote_config = forge.remote_config();
        Self {
            forge,
            remote_config,
        }
    }

    pub fn repo_name(&self) -> String {
        self.forge.repo_name()
    }

    pub fn remote_config(&self) -> RemoteConfig {
        self.remote_config.clone()
    }

    pub fn default_branch(&self) -> String {
        self.forge.default_branch()
    }

    pub async fn get_file_content(
        &self,
        req: GetFileContentRequest,
    ) -> Result<Option<String>> {
        self.forge.get_file_content(req).await
    }

    pub async fn list_commits(
        &self,
        req: ListCommitsRequest,
    ) -> Result<Vec<ForgeCommit>> {
        debug!(
            "getting commits for branch [{}] starting from sha: {:?}",
            req.branch, req.since_sha
        );
        self.forge.list_commits(req).await
    }

    /// Most recently merged pull request into `base_branch` satisfying
    /// `predicate`
    pub async fn find_merged_pr<P>(
        &self,
        base_branch: &str,
        predicate: P,
    ) -> Result<Option<PullRequest>>
    where
        P: Fn(&PullRequest) -> bool,
    {
        let merged = self.forge.list_merged_pull_requests(base_branch).await?;
        Ok(merged.into_iter().find(|pr| predicate(pr)))
    }

    /// Every merged pull request into `base_branch` satisfying `predicate`,
    /// most recently merged first
    pub async fn find_merged_prs<P>(
        &self,
        base_branch: &str,
        predicate: P,
    ) -> Result<Vec<PullRequest>>
    where
        P: Fn(&PullRequest) -> bool,
    {
        let merged = self.forge.list_merged_pull_requests(base_branch).await?;
        Ok(merged.into_iter().filter(|pr| predicate(pr)).collect())
    }

    pub async fn find_open_prs<P>(
        &self,
        base_branch: &str,
        predicate: P,
    ) -> Result<Vec<PullRequest>>
    where
        P: Fn(&PullRequest) -> bool,
    {
        let open = self.forge.list_open_pull_requests(base_branch).await?;
        Ok(open.into_iter().filter(|pr| predicate(pr)).collect())
    }

    pub async fn get_pull_request_files(
        &self,
        pr_number: u64,
    ) -> Result<Vec<String>> {
        self.forge.get_pull_request_files(pr_number).await
    }

    pub async fn create_pull_request(
        &self,
        req: CreatePrRequest,
    ) -> Result<PullRequest> {
        if self.remote_config.dry_run {
            warn!("dry_run: would create PR: req: {:#?}", req);
            return Ok(PullRequest {
                number: 0,
                head_branch: req.head_branch,
                base_branch: req.base_branch,
                title: req.title,
                body: req.body,
                labels: req.labels,
                merge_commit_sha: None,
            });
        }

        self.forge.create_pull_request(req).await
    }

    pub async fn update_pull_request(
        &self,
        req: UpdatePrRequest,
    ) -> Result<()> {
        if self.remote_config.dry_run {
            warn!("dry_run: would update PR: req: {:#?}", req);
            return Ok(());
        }
        self.forge.update_pull_request(req).await
    }

    pub async fn close_pull_request(&self, pr_number: u64) -> Result<()> {
        if self.remote_config.dry_run {
            warn!("dry_run: would close PR: {pr_number}");
            return Ok(());
        }
        self.forge.close_pull_request(pr_number).await
    }

    pub async fn create_release(
        &self,
        req: CreateReleaseRequest,
    ) -> Result<Release> {
        if self.remote_config.dry_run {
            warn!("dry_run: would create release: req: {:#?}", req);
            return Ok(Release {
                tag: req.tag,
                url: "".into(),
            });
        }
        self.forge.create_release(req).await
    }

    pub async fn add_labels(&self, req: PrLabelsRequest) -> Result<()> {
        if self.remote_config.dry_run {
            warn!("dry_run: would add PR labels: req: {:#?}", req);
            return Ok(());
        }
        self.forge.add_labels(req).await
    }

    pub async fn remove_labels(&self, req: PrLabelsRequest) -> Result<()> {
        if self.remote_config.dry_run {
            warn!("dry_run: would remove PR labels: req: {:#?}", req);
            return Ok(());
        }
        self.forge.remove_labels(req).await
    }

    pub async fn comment_on_issue(
        &self,
        issue_number: u64,
        body: &str,
    ) -> Result<()> {
        if self.remote_config.dry_run {
            warn!("dry_run: would comment on #{issue_number}: {body}");
            return Ok(());
        }
        self.forge.comment_on_issue(issue_number, body).await
    }
}
