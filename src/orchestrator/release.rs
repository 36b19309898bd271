//! Forge releases for merged release pull requests.
use futures::future::join_all;
use log::*;

use crate::{
    MonoreleaseError, Result,
    codec::BranchName,
    config::{
        DEFAULT_CONFIG_FILE, DEFAULT_MANIFEST_FILE, package::PackageConfig,
    },
    forge::request::{
        CreateReleaseRequest, ForgeCommit, PrLabelsRequest, PullRequest,
        Release,
    },
    orchestrator::{Orchestrator, body::release_notes},
    path_helpers::{is_under, normalize_path},
    splitter::CommitSplit,
};

impl Orchestrator {
    /// Most recently merged pull request of each release branch, most
    /// recent first
    pub(super) async fn merged_release_pull_requests(
        &self,
    ) -> Result<Vec<PullRequest>> {
        let target = self.target_branch.as_str();

        let branches = match self.config.separate_pull_requests {
            true => self
                .config
                .packages
                .iter()
                .map(|p| BranchName::for_component(target, &p.component))
                .map(|b| b.to_string())
                .collect::<Vec<String>>(),
            false => vec![BranchName::aggregate(target).to_string()],
        };

        let merged = self
            .forge
            .find_merged_prs(target, |pr| branches.contains(&pr.head_branch))
            .await?;

        let mut latest: Vec<PullRequest> = vec![];

        for pr in merged {
            if !latest.iter().any(|l| l.head_branch == pr.head_branch) {
                latest.push(pr);
            }
        }

        Ok(latest)
    }

    /// Creates the releases proposed by a merged pull request. Returns the
    /// created releases and the number of packages that failed; labels move
    /// from pending to tagged only when nothing failed.
    pub(super) async fn release_pull_request(
        &self,
        splitter: &CommitSplit,
        pr: &PullRequest,
    ) -> Result<(Vec<Release>, usize)> {
        if self.is_tagged(pr) {
            info!("release pull request #{} is already tagged", pr.number);
            return Ok((vec![], 0));
        }

        if !self.is_pending(pr) {
            warn!(
                "release pull request #{} is missing the {:?} label(s): not releasing",
                pr.number, self.config.pending_labels
            );
            return Ok((vec![], 0));
        }

        let sha = pr.merge_commit_sha.clone().ok_or_else(|| {
            MonoreleaseError::forge(format!(
                "merged pull request #{} has no merge commit",
                pr.number
            ))
        })?;

        let files = self.forge.get_pull_request_files(pr.number).await?;
        let affected = self.affected_packages(splitter, pr, &sha, files);

        if affected.is_empty() {
            warn!(
                "release pull request #{} touches no configured package",
                pr.number
            );
            return Ok((vec![], 0));
        }

        let (versions, resolved_at) =
            self.manifest().resolve_versions(Some(&sha)).await?;

        let mut requests = vec![];

        for package in affected {
            if package.skip_release {
                info!("{}: skip-release is set", package.path);
                continue;
            }

            let Some(version) = versions.get(&package.path) else {
                warn!(
                    "{}: no version in the manifest at {resolved_at:?}: skipping",
                    package.path
                );
                continue;
            };

            let tag = package.tag_name(version).to_string();

            let notes = release_notes(&pr.body, &package.component, version)
                .unwrap_or_else(|| {
                    warn!(
                        "no notes for {tag} in release pull request #{}",
                        pr.number
                    );
                    "".into()
                });

            requests.push(CreateReleaseRequest {
                name: tag.clone(),
                tag,
                sha: sha.clone(),
                notes,
                draft: package.draft,
                prerelease: !version.pre.is_empty(),
            });
        }

        let outcomes = join_all(requests.into_iter().map(|req| async move {
            let tag = req.tag.clone();
            info!("creating release {tag} at {}", req.sha);
            (tag, self.forge.create_release(req).await)
        }))
        .await;

        let mut releases = vec![];
        let mut failures = vec![];

        for (tag, outcome) in outcomes {
            match outcome {
                Ok(release) => {
                    info!("created release {tag}");
                    releases.push(release);
                }
                Err(MonoreleaseError::DuplicateRelease(_)) => {
                    info!("release {tag} already exists");
                }
                Err(err) => {
                    error!("failed to create release {tag}: {err}");
                    failures.push((tag, err));
                }
            }
        }

        for (tag, err) in failures.iter() {
            self.forge
                .comment_on_issue(
                    pr.number,
                    &format!(
                        ":warning: Failed to create release `{tag}`: {err}\n\nRe-run the release step to retry."
                    ),
                )
                .await?;
        }

        if !failures.is_empty() {
            warn!(
                "{} release(s) failed: leaving #{} pending",
                failures.len(),
                pr.number
            );
            return Ok((releases, failures.len()));
        }

        // tagged first: a run interrupted here is still seen as released
        self.forge
            .add_labels(PrLabelsRequest {
                pr_number: pr.number,
                labels: self.config.tagged_labels.clone(),
            })
            .await?;

        self.forge
            .remove_labels(PrLabelsRequest {
                pr_number: pr.number,
                labels: self.config.pending_labels.clone(),
            })
            .await?;

        Ok((releases, 0))
    }

    /// Packages changed by the merged pull request, found by splitting its
    /// file list as one commit. The root package is affected by any file
    /// outside the other packages except the manifest and config files.
    fn affected_packages(
        &self,
        splitter: &CommitSplit,
        pr: &PullRequest,
        sha: &str,
        files: Vec<String>,
    ) -> Vec<&PackageConfig> {
        let others = self
            .config
            .packages
            .iter()
            .filter(|p| p.path != ".")
            .map(|p| p.path.as_str())
            .collect::<Vec<&str>>();

        let root_touched = files.iter().any(|file| {
            let file = normalize_path(file);
            let file = file.trim_start_matches('/');
            file != DEFAULT_MANIFEST_FILE
                && file != DEFAULT_CONFIG_FILE
                && !others.iter().any(|p| is_under(file, p))
        });

        let merged = ForgeCommit {
            id: sha.to_string(),
            message: pr.title.clone(),
            files,
            ..ForgeCommit::default()
        };

        let buckets = splitter.split(std::slice::from_ref(&merged));

        // a per-component pull request only releases its own component
        let component = BranchName::parse(&pr.head_branch)
            .and_then(|b| b.component().map(String::from));

        self.config
            .packages
            .iter()
            .filter(|p| match p.path.as_str() {
                "." => root_touched,
                path => buckets.contains_key(path),
            })
            .filter(|p| component.as_deref().is_none_or(|c| c == p.component))
            .collect()
    }
}
