//! Release pull request assembly: candidates, change set and the idempotent
//! open/update/close sequence.
use log::*;
use std::collections::{BTreeMap, HashMap, hash_map::Entry};

use crate::{
    Result,
    analyzer::ReleaseCandidate,
    codec::{BranchName, PullRequestTitle},
    config::DEFAULT_MANIFEST_FILE,
    forge::request::{
        CreatePrRequest, FileChange, ForgeCommit, GetFileContentRequest,
        ListCommitsRequest, PullRequest, UpdatePrRequest,
    },
    manifest::{ManifestResolver, VersionManifest, serialize_manifest},
    orchestrator::{
        Orchestrator, PendingPullRequest, ReleasePlan, body::render_body,
    },
    plugin::build_plugins,
    splitter::CommitSplit,
    updater::{file_updates, released_versions},
};

/// Commits since one release commit, split per package, and the manifest
/// snapshot taken at that commit
struct History {
    commits: Vec<ForgeCommit>,
    buckets: BTreeMap<String, Vec<ForgeCommit>>,
    versions: VersionManifest,
}

/// Component a release pull request was opened for, read from its branch
/// or, failing that, its title
fn pull_request_component(pr: &PullRequest) -> Option<String> {
    BranchName::parse(&pr.head_branch)
        .and_then(|b| b.component().map(String::from))
        .or_else(|| {
            PullRequestTitle::parse(&pr.title)
                .and_then(|t| t.component().map(String::from))
        })
}

impl Orchestrator {
    /// Versions and candidates after the plugin pipeline, candidates sorted
    /// by path. `None` when no package has anything to release.
    pub(super) async fn release_plan(
        &self,
        splitter: &CommitSplit,
    ) -> Result<Option<ReleasePlan>> {
        let plugins =
            build_plugins(&self.config.plugins, &self.config.packages)?;

        let manifest = self.manifest();

        let shared_since = match self.config.separate_pull_requests {
            true => None,
            false => Some(manifest.last_release_sha(None).await?),
        };

        let mut histories: HashMap<Option<String>, History> = HashMap::new();
        let mut prior_versions = VersionManifest::new();
        let mut candidates = vec![];

        for package in self.config.packages.iter() {
            let since = match &shared_since {
                Some(since) => since.clone(),
                None => {
                    manifest
                        .last_release_sha(Some(&package.component))
                        .await?
                }
            };

            let history = match histories.entry(since) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let since = entry.key().clone();
                    let history = self
                        .history(&manifest, splitter, since.as_deref())
                        .await?;
                    entry.insert(history)
                }
            };

            let prior = history.versions.get(&package.path);

            // plugins see prior versions of unchanged packages too
            if let Some(prior) = prior {
                prior_versions.insert(package.path.clone(), prior.clone());
            }

            let commits = if package.path == "." {
                &history.commits
            } else {
                match history.buckets.get(&package.path) {
                    Some(commits) => commits,
                    None => {
                        debug!(
                            "{}: no commits since the last release",
                            package.path
                        );
                        continue;
                    }
                }
            };

            if let Some(candidate) =
                self.analyzer.resolve(package, prior, commits)?
            {
                candidates.push(candidate);
            }
        }

        if candidates.is_empty() {
            info!("nothing to release on {}", self.target_branch);
            return Ok(None);
        }

        let mut versions = prior_versions.clone();

        for candidate in candidates.iter() {
            versions
                .insert(candidate.path.clone(), candidate.next_version.clone());
        }

        if plugins.is_empty() {
            return Ok(Some(ReleasePlan {
                prior: prior_versions,
                versions,
                candidates,
            }));
        }

        for plugin in plugins.iter() {
            debug!("running plugin: {}", plugin.name());
            (versions, candidates) = plugin.run(versions, candidates)?;
        }

        debug!("versions after plugins: {versions:?}");

        candidates.sort_by(|a, b| a.path.cmp(&b.path));

        // the versions map wins over candidate versions after plugins
        for candidate in candidates.iter_mut() {
            match versions.get(&candidate.path) {
                Some(version) if version != &candidate.next_version => {
                    debug!("{}: released at {version}", candidate.path);
                    candidate.next_version = version.clone();
                }
                Some(_) => {}
                None => {
                    versions.insert(
                        candidate.path.clone(),
                        candidate.next_version.clone(),
                    );
                }
            }

            let package = self.package(&candidate.path)?;
            candidate.changelog_entry =
                self.analyzer.render(package, candidate)?;
        }

        Ok(Some(ReleasePlan {
            prior: prior_versions,
            versions,
            candidates,
        }))
    }

    /// One pull request per candidate with separate pull requests, one
    /// aggregate pull request otherwise
    pub(super) async fn pending_pull_requests(
        &self,
        plan: ReleasePlan,
    ) -> Result<Vec<PendingPullRequest>> {
        let (tip, _) = self.manifest().resolve_versions(None).await?;
        let released = plan.released();
        let candidates = plan.candidates;

        let groups = match self.config.separate_pull_requests {
            true => candidates.into_iter().map(|c| vec![c]).collect(),
            false => vec![candidates],
        };

        let mut pending = vec![];

        for group in groups {
            let (branch, title) = self.identity(&group);
            let changeset = self.changeset(&tip, &released, &group).await?;

            pending.push(PendingPullRequest {
                branch,
                title,
                body: render_body(&group),
                changeset,
                labels: self.config.pending_labels.clone(),
            });
        }

        Ok(pending)
    }

    /// Opens or updates each pending pull request, then closes release pull
    /// requests it supersedes
    pub(super) async fn open_pull_requests(
        &self,
        pending: Vec<PendingPullRequest>,
    ) -> Result<Vec<u64>> {
        let target = self.target_branch.clone();

        let open = self
            .forge
            .find_open_prs(&target, |pr| {
                BranchName::parse(&pr.head_branch)
                    .is_some_and(|b| b.targets(&target))
            })
            .await?;

        let mut numbers = vec![];

        for pr in pending {
            let number = self.open_pull_request(&open, &pr).await?;
            self.close_superseded(&open, &pr, number).await?;
            numbers.push(number);
        }

        Ok(numbers)
    }

    ////////////////////////////////////////////////////////////////////////////
    //// private
    ////////////////////////////////////////////////////////////////////////////

    async fn history(
        &self,
        manifest: &ManifestResolver<'_>,
        splitter: &CommitSplit,
        since: Option<&str>,
    ) -> Result<History> {
        let commits = self
            .forge
            .list_commits(ListCommitsRequest {
                branch: self.target_branch.clone(),
                since_sha: since.map(String::from),
            })
            .await?;

        info!(
            "found {} commits since {}",
            commits.len(),
            since.unwrap_or("the beginning of history")
        );

        let buckets = splitter.split(&commits);
        let (versions, resolved_at) = manifest.resolve_versions(since).await?;

        debug!("prior versions resolved at {resolved_at:?}: {versions:?}");

        Ok(History {
            commits,
            buckets,
            versions,
        })
    }

    fn identity(
        &self,
        group: &[ReleaseCandidate],
    ) -> (BranchName, PullRequestTitle) {
        let branch = self.target_branch.clone();

        match group {
            [only] if self.config.separate_pull_requests => (
                BranchName::for_component(&branch, &only.component),
                PullRequestTitle::Component {
                    branch,
                    component: only.component.clone(),
                    version: only.next_version.to_string(),
                },
            ),
            [only] if self.config.packages.len() == 1 => (
                BranchName::aggregate(&branch),
                PullRequestTitle::Version {
                    branch,
                    version: only.next_version.to_string(),
                },
            ),
            _ => (
                BranchName::aggregate(&branch),
                PullRequestTitle::Aggregate { branch },
            ),
        }
    }

    /// Manifest update plus every file update of the group. The manifest
    /// takes the released versions of the plan, limited to the group's own
    /// packages with separate pull requests. Files are read from the target
    /// branch; updates that produce nothing or leave the content unchanged
    /// are dropped.
    async fn changeset(
        &self,
        tip: &VersionManifest,
        released: &VersionManifest,
        group: &[ReleaseCandidate],
    ) -> Result<Vec<FileChange>> {
        let mut manifest = tip.clone();

        let in_scope = |path: &str| {
            !self.config.separate_pull_requests
                || group.iter().any(|c| c.path == path)
        };

        for (path, version) in released.iter() {
            if in_scope(path) {
                manifest.insert(path.clone(), version.clone());
            }
        }

        for candidate in group.iter() {
            manifest
                .insert(candidate.path.clone(), candidate.next_version.clone());
        }

        let mut changes = vec![FileChange {
            path: DEFAULT_MANIFEST_FILE.to_string(),
            content: serialize_manifest(&manifest)?,
        }];

        let released = released_versions(&self.config.packages, group);

        for candidate in group.iter() {
            let package = self.package(&candidate.path)?;

            for update in file_updates(package, candidate, &released) {
                let staged = changes.iter().position(|c| c.path == update.path);

                let old = match staged {
                    Some(i) => Some(changes[i].content.clone()),
                    None => {
                        self.forge
                            .get_file_content(GetFileContentRequest {
                                git_ref: Some(self.target_branch.clone()),
                                path: update.path.clone(),
                            })
                            .await?
                    }
                };

                let Some(content) =
                    update.updater.update_content(old.as_deref())?
                else {
                    debug!("{}: nothing to update", update.path);
                    continue;
                };

                if old.as_deref() == Some(content.as_str()) {
                    debug!("{}: unchanged", update.path);
                    continue;
                }

                match staged {
                    Some(i) => changes[i].content = content,
                    None => changes.push(FileChange {
                        path: update.path,
                        content,
                    }),
                }
            }
        }

        Ok(changes)
    }

    async fn open_pull_request(
        &self,
        open: &[PullRequest],
        pending: &PendingPullRequest,
    ) -> Result<u64> {
        let head = pending.branch.to_string();

        let existing = open
            .iter()
            .find(|pr| pr.head_branch == head && self.is_pending(pr));

        match existing {
            Some(pr) if pr.body == pending.body => {
                info!("release pull request #{} is up to date", pr.number);
                Ok(pr.number)
            }
            Some(pr) => {
                info!("updating release pull request #{}", pr.number);

                self.forge
                    .update_pull_request(UpdatePrRequest {
                        pr_number: pr.number,
                        head_branch: head,
                        base_branch: self.target_branch.clone(),
                        title: pending.title.to_string(),
                        body: pending.body.clone(),
                        file_changes: pending.changeset.clone(),
                    })
                    .await?;

                Ok(pr.number)
            }
            None => {
                info!("opening release pull request from {head}");

                let pr = self
                    .forge
                    .create_pull_request(CreatePrRequest {
                        head_branch: head,
                        base_branch: self.target_branch.clone(),
                        title: pending.title.to_string(),
                        body: pending.body.clone(),
                        file_changes: pending.changeset.clone(),
                        labels: pending.labels.clone(),
                    })
                    .await?;

                info!("opened release pull request #{}", pr.number);

                Ok(pr.number)
            }
        }
    }

    /// Closes other pending release pull requests in the same scope: every
    /// one of them for an aggregate pull request, those of the same
    /// component otherwise
    async fn close_superseded(
        &self,
        open: &[PullRequest],
        pending: &PendingPullRequest,
        number: u64,
    ) -> Result<()> {
        let head = pending.branch.to_string();
        let component = pending.branch.component();

        let superseded = open.iter().filter(|pr| {
            pr.number != number
                && pr.head_branch != head
                && self.is_pending(pr)
                && component.is_none_or(|c| {
                    pull_request_component(pr).as_deref() == Some(c)
                })
        });

        for pr in superseded {
            info!(
                "closing release pull request #{} superseded by #{number}",
                pr.number
            );

            self.forge
                .comment_on_issue(
                    pr.number,
                    &format!("Superseded by #{number}."),
                )
                .await?;

            self.forge.close_pull_request(pr.number).await?;
        }

        Ok(())
    }
}
