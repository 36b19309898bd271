//! Release pull request and release orchestration.
//!
//! Both entry points are short state machines driven entirely by forge
//! state: the release pull request branch, its labels and the manifest
//! file. Nothing else is persisted between runs, so every mutation is safe
//! to repeat.
use derive_builder::Builder;
use std::rc::Rc;

use crate::{
    MonoreleaseError, Result,
    analyzer::{Analyzer, ReleaseCandidate},
    codec::{BranchName, PullRequestTitle},
    config::{package::PackageConfig, resolver::ResolvedConfig},
    forge::{
        manager::ForgeManager,
        request::{FileChange, PullRequest, Release},
    },
    manifest::{ManifestResolver, VersionManifest},
    splitter::{CommitSplit, SplitOptions},
};

mod body;
mod pull_request;
mod release;

/// Release pull request assembled for one branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPullRequest {
    pub branch: BranchName,
    pub title: PullRequestTitle,
    pub body: String,
    pub changeset: Vec<FileChange>,
    pub labels: Vec<String>,
}

/// Output of the plugin pipeline: the manifest versions and candidates the
/// release pull request(s) are built from
#[derive(Debug, Clone, Default)]
pub struct ReleasePlan {
    /// Versions every package had at the last release
    pub prior: VersionManifest,
    /// Prior versions overlaid with the versions being released
    pub versions: VersionManifest,
    pub candidates: Vec<ReleaseCandidate>,
}

impl ReleasePlan {
    /// Entries of `versions` that moved away from their prior version
    pub fn released(&self) -> VersionManifest {
        self.versions
            .iter()
            .filter(|(path, version)| self.prior.get(*path) != Some(*version))
            .map(|(path, version)| (path.clone(), version.clone()))
            .collect()
    }
}

#[derive(Builder)]
#[builder(setter(into), build_fn(private, name = "_build"))]
pub struct OrchestratorParams {
    pub config: Rc<ResolvedConfig>,
    pub forge: Rc<ForgeManager>,
    /// Defaults to the default branch of the repository
    #[builder(default, setter(into, strip_option))]
    pub target_branch: Option<String>,
}

impl OrchestratorParamsBuilder {
    pub fn build(&self) -> Result<Orchestrator> {
        let params = self._build().map_err(|e| {
            MonoreleaseError::invalid_config(format!(
                "Failed to build orchestrator: {}",
                e
            ))
        })?;
        Orchestrator::new(params)
    }
}

pub struct Orchestrator {
    config: Rc<ResolvedConfig>,
    forge: Rc<ForgeManager>,
    target_branch: String,
    analyzer: Analyzer,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorParamsBuilder {
        OrchestratorParamsBuilder::default()
    }

    pub fn new(params: OrchestratorParams) -> Result<Self> {
        let target_branch = params
            .target_branch
            .unwrap_or_else(|| params.forge.default_branch());

        let remote = params.forge.remote_config();
        let repo_url =
            format!("https://{}/{}/{}", remote.host, remote.owner, remote.repo);

        let analyzer =
            Analyzer::new(params.config.changelog_template.clone(), repo_url);

        Ok(Self {
            config: Rc::clone(&params.config),
            forge: Rc::clone(&params.forge),
            target_branch,
            analyzer,
        })
    }

    /// Opens, updates or leaves untouched the release pull request(s) for
    /// the target branch. Returns the numbers of the pull requests that now
    /// represent the pending release, empty when nothing is releasable.
    pub async fn create_pull_requests(&self) -> Result<Vec<u64>> {
        let splitter = self.validate().await?;

        let Some(plan) = self.release_plan(&splitter).await? else {
            return Ok(vec![]);
        };

        let pending = self.pending_pull_requests(plan).await?;

        self.open_pull_requests(pending).await
    }

    /// Creates forge releases for the most recently merged release pull
    /// request(s) and marks them tagged once every release exists.
    pub async fn create_releases(&self) -> Result<Vec<Release>> {
        let splitter = self.validate().await?;

        let merged = self.merged_release_pull_requests().await?;

        if merged.is_empty() {
            log::info!(
                "no merged release pull request found for {}",
                self.target_branch
            );
            return Ok(vec![]);
        }

        let mut releases = vec![];
        let mut failed = 0;

        for pr in merged {
            let (created, failures) =
                self.release_pull_request(&splitter, &pr).await?;
            releases.extend(created);
            failed += failures;
        }

        // every pull request was processed; failed ones stay pending
        if failed > 0 {
            return Err(MonoreleaseError::forge(format!(
                "failed to create {failed} release(s): re-run to retry"
            )));
        }

        Ok(releases)
    }

    ////////////////////////////////////////////////////////////////////////////
    //// private
    ////////////////////////////////////////////////////////////////////////////

    fn package(&self, path: &str) -> Result<&PackageConfig> {
        self.config.package(path).ok_or_else(|| {
            MonoreleaseError::not_found(format!(
                "no package configured at {path}"
            ))
        })
    }

    fn is_pending(&self, pr: &PullRequest) -> bool {
        self.config.pending_labels.iter().all(|l| pr.has_label(l))
    }

    fn is_tagged(&self, pr: &PullRequest) -> bool {
        self.config.tagged_labels.iter().any(|l| pr.has_label(l))
    }

    fn manifest(&self) -> ManifestResolver<'_> {
        ManifestResolver::new(&self.forge, &self.config, &self.target_branch)
    }

    /// Checks the manifest and the package layout before any mutation
    async fn validate(&self) -> Result<CommitSplit> {
        let splitter = CommitSplit::new(SplitOptions {
            include_empty: true,
            package_paths: Some(self.config.package_paths()),
        })?;

        self.manifest().validate().await?;

        Ok(splitter)
    }
}

#[cfg(test)]
mod tests;
