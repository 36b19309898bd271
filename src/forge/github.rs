//! Implements the Forge trait for Github
use async_trait::async_trait;
use log::*;
use octocrab::{
    Octocrab, Page,
    models::{
        pulls::PullRequest as GithubPullRequest,
        repos::{DiffEntry, Object},
    },
    params::{self, repos::Reference},
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{future::Future, time::Duration};

use crate::{
    MonoreleaseError, Result,
    forge::{
        config::{DEFAULT_PAGE_SIZE, MAX_TRANSIENT_ATTEMPTS, RemoteConfig},
        request::{
            CreatePrRequest, CreateReleaseRequest, FileChange, ForgeCommit,
            GetFileContentRequest, ListCommitsRequest, PrLabelsRequest,
            PullRequest, Release, UpdatePrRequest,
        },
        traits::Forge,
    },
};

pub const TREE_BLOB_MODE: &str = "100644";
pub const TREE_BLOB_TYPE: &str = "blob";

impl From<GithubPullRequest> for PullRequest {
    fn from(pr: GithubPullRequest) -> Self {
        let merged = pr.merged_at.is_some();
        Self {
            number: pr.number,
            head_branch: pr.head.ref_field,
            base_branch: pr.base.ref_field,
            title: pr.title.unwrap_or_default(),
            body: pr.body.unwrap_or_default(),
            labels: pr
                .labels
                .unwrap_or_default()
                .into_iter()
                .map(|l| l.name)
                .collect(),
            merge_commit_sha: if merged { pr.merge_commit_sha } else { None },
        }
    }
}

#[derive(Debug, Serialize)]
struct GithubTreeEntry {
    pub path: String,
    pub mode: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
struct GithubTree {
    pub base_tree: String,
    pub tree: Vec<GithubTreeEntry>,
}

#[derive(Debug, Deserialize)]
struct Sha {
    pub sha: String,
}

/// Runs `op`, retrying transient (5xx) failures a bounded number of times.
/// Every other error is returned immediately.
async fn with_retry<T, F, Fut>(name: &str, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;

    loop {
        match op().await {
            Err(err)
                if err.is_transient() && attempt < MAX_TRANSIENT_ATTEMPTS =>
            {
                warn!(
                    "{name}: attempt {attempt}/{MAX_TRANSIENT_ATTEMPTS} failed: {err}: retrying"
                );
                tokio::time::sleep(Duration::from_millis(
                    500 * u64::from(attempt),
                ))
                .await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// GitHub forge implementation using the Octocrab REST client
pub struct Github {
    config: RemoteConfig,
    base_uri: String,
    instance: Octocrab,
    default_branch: String,
}

impl Github {
    /// Create GitHub client with personal access token authentication and API
    /// base URL configuration.
    pub async fn new(config: RemoteConfig) -> Result<Self> {
        let base_uri = config.api_url.trim_end_matches('/').to_string();
        let instance = Octocrab::builder()
            .personal_token(config.token.expose_secret().to_string())
            .base_uri(base_uri.clone())?
            .build()?;

        let repo = with_retry("get repository", || async {
            instance
                .repos(&config.owner, &config.repo)
                .get()
                .await
                .map_err(MonoreleaseError::from)
        })
        .await?;

        let default_branch = repo.default_branch.ok_or_else(|| {
            MonoreleaseError::not_found(format!(
                "failed to find default branch for github repo: {}/{}",
                config.owner, config.repo
            ))
        })?;

        Ok(Self {
            config,
            base_uri,
            instance,
            default_branch,
        })
    }

    fn repo_route(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.base_uri, self.config.owner, self.config.repo, suffix
        )
    }

    async fn post_json<R: DeserializeOwned>(
        &self,
        name: &str,
        route: &str,
        body: &serde_json::Value,
    ) -> Result<R> {
        with_retry(name, || async move {
            self.instance
                .post(route, Some(body))
                .await
                .map_err(MonoreleaseError::from)
        })
        .await
    }

    /// Items of `first` followed by those of every following page
    async fn collect_pages<T: DeserializeOwned>(
        &self,
        name: &str,
        mut page: Page<T>,
    ) -> Result<Vec<T>> {
        let mut items = page.take_items();

        loop {
            let next = &page.next;

            let fetched = with_retry(name, || async move {
                self.instance
                    .get_page::<T>(next)
                    .await
                    .map_err(MonoreleaseError::from)
            })
            .await?;

            let Some(mut fetched) = fetched else {
                return Ok(items);
            };

            items.append(&mut fetched.take_items());
            page = fetched;
        }
    }

    async fn get_branch_sha(&self, branch: &str) -> Result<Option<String>> {
        let reference = &Reference::Branch(branch.to_string());

        let result = with_retry("get ref", || async move {
            self.instance
                .repos(&self.config.owner, &self.config.repo)
                .get_ref(reference)
                .await
                .map_err(MonoreleaseError::from)
        })
        .await;

        match result {
            Ok(found) => match found.object {
                Object::Commit { sha, .. } => Ok(Some(sha)),
                _ => Err(MonoreleaseError::forge(format!(
                    "ref of branch {branch} does not point at a commit"
                ))),
            },
            Err(MonoreleaseError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_tree(&self, tree: GithubTree) -> Result<Sha> {
        let route = self.repo_route("/git/trees");
        let body = serde_json::json!(tree);

        info!("creating tree starting from: {}", tree.base_tree);

        let tree: Sha = self.post_json("create tree", &route, &body).await?;

        info!("created new tree: {}", tree.sha);

        Ok(tree)
    }

    async fn create_commit(
        &self,
        message: &str,
        parent_sha: &str,
        tree_sha: &str,
    ) -> Result<Sha> {
        let route = self.repo_route("/git/commits");
        let body = serde_json::json!({
          "message": message,
          "tree": tree_sha,
          "parents": [parent_sha],
        });

        self.post_json("create commit", &route, &body).await
    }

    /// Points `branch` at a single new commit on top of `base_branch`
    /// containing `file_changes`, creating or force updating the ref.
    async fn push_release_branch(
        &self,
        branch: &str,
        base_branch: &str,
        message: &str,
        file_changes: Vec<FileChange>,
    ) -> Result<()> {
        let base_sha =
            self.get_branch_sha(base_branch).await?.ok_or_else(|| {
                MonoreleaseError::not_found(format!(
                    "failed to find sha of branch: {base_branch}"
                ))
            })?;

        let entries = file_changes
            .into_iter()
            .map(|change| GithubTreeEntry {
                path: change.path,
                mode: TREE_BLOB_MODE.into(),
                kind: TREE_BLOB_TYPE.into(),
                content: change.content,
            })
            .collect::<Vec<GithubTreeEntry>>();

        let tree = self
            .create_tree(GithubTree {
                base_tree: base_sha.clone(),
                tree: entries,
            })
            .await?;

        let commit = self.create_commit(message, &base_sha, &tree.sha).await?;

        info!("created commit for branch {branch}: sha: {}", commit.sha);

        if self.get_branch_sha(branch).await?.is_some() {
            info!("release branch {branch} already exists: updating");
            // the typed ref update cannot force push
            let route =
                self.repo_route(&format!("/git/refs/heads/{branch}"));
            let body =
                serde_json::json!({ "sha": commit.sha, "force": true });
            with_retry("update ref", || async {
                self.instance
                    .patch::<serde_json::Value, _, _>(&route, Some(&body))
                    .await
                    .map_err(MonoreleaseError::from)
            })
            .await?;
            return Ok(());
        }

        info!("creating release branch {branch}");

        let reference = &Reference::Branch(branch.to_string());
        let sha = commit.sha.as_str();

        with_retry("create ref", || async move {
            self.instance
                .repos(&self.config.owner, &self.config.repo)
                .create_ref(reference, sha)
                .await
                .map_err(MonoreleaseError::from)
        })
        .await?;

        Ok(())
    }

    /// Every pull request against `base_branch` in `state`, most recently
    /// updated first
    async fn list_pulls(
        &self,
        state: params::State,
        base_branch: &str,
    ) -> Result<Vec<GithubPullRequest>> {
        let first = with_retry("list pull requests", || async move {
            self.instance
                .pulls(&self.config.owner, &self.config.repo)
                .list()
                .state(state)
                .base(base_branch)
                .sort(params::pulls::Sort::Updated)
                .direction(params::Direction::Descending)
                .per_page(DEFAULT_PAGE_SIZE)
                .send()
                .await
                .map_err(MonoreleaseError::from)
        })
        .await?;

        self.collect_pages("list pull requests", first).await
    }
}

#[async_trait]
impl Forge for Github {
    fn repo_name(&self) -> String {
        self.config.repo.clone()
    }

    fn remote_config(&self) -> RemoteConfig {
        self.config.clone()
    }

    fn default_branch(&self) -> String {
        self.default_branch.clone()
    }

    async fn get_file_content(
        &self,
        req: GetFileContentRequest,
    ) -> Result<Option<String>> {
        let path = req.path.as_str();
        let git_ref = req.git_ref.as_deref();

        let result = with_retry("get file content", || async move {
            let repos = self
                .instance
                .repos(&self.config.owner, &self.config.repo);
            let mut builder = repos
                .get_content()
                .path(path);

            if let Some(git_ref) = git_ref {
                builder = builder.r#ref(git_ref);
            }

            builder.send().await.map_err(MonoreleaseError::from)
        })
        .await;

        let items = match result {
            Ok(mut data) => data.take_items(),
            Err(MonoreleaseError::NotFound(_)) => {
                info!("no file found for path: {path}");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let Some(item) = items.first() else {
            info!("no file found for path: {path}");
            return Ok(None);
        };

        item.decoded_content().map(Some).ok_or_else(|| {
            MonoreleaseError::forge(format!(
                "failed to decode file content for path: {path}"
            ))
        })
    }

    async fn list_commits(
        &self,
        req: ListCommitsRequest,
    ) -> Result<Vec<ForgeCommit>> {
        let search_depth = self.config.commit_search_depth as usize;
        let branch = req.branch.as_str();
        let mut commits: Vec<ForgeCommit> = vec![];
        let mut page: u32 = 1;

        'pages: loop {
            let batch = with_retry("list commits", || async move {
                self.instance
                    .repos(&self.config.owner, &self.config.repo)
                    .list_commits()
                    .sha(branch)
                    .per_page(DEFAULT_PAGE_SIZE)
                    .page(page)
                    .send()
                    .await
                    .map_err(MonoreleaseError::from)
            })
            .await?;

            if batch.items.is_empty() {
                break;
            }

            let last_page = batch.next.is_none();

            for listed in batch.items {
                if req.since_sha.as_deref() == Some(listed.sha.as_str()) {
                    break 'pages;
                }

                if req.since_sha.is_none() && commits.len() >= search_depth {
                    break 'pages;
                }

                // the list endpoint omits files
                let sha = listed.sha.as_str();
                let detailed = with_retry("get commit", || async move {
                    self.instance
                        .commits(&self.config.owner, &self.config.repo)
                        .get(sha)
                        .await
                        .map_err(MonoreleaseError::from)
                })
                .await?;

                let timestamp = listed
                    .commit
                    .committer
                    .as_ref()
                    .and_then(|c| c.date)
                    .map(|date| date.timestamp())
                    .unwrap_or_default();

                commits.push(ForgeCommit {
                    short_id: listed.sha.chars().take(8).collect(),
                    link: format!(
                        "{}/{}",
                        self.config.commit_link_base_url, listed.sha
                    ),
                    id: listed.sha,
                    message: listed.commit.message,
                    timestamp,
                    files: detailed
                        .files
                        .unwrap_or_default()
                        .into_iter()
                        .map(|f| f.filename)
                        .collect(),
                });
            }

            if last_page {
                break;
            }

            page += 1;
        }

        debug!("found {} commits on {branch}", commits.len());

        Ok(commits)
    }

    async fn list_merged_pull_requests(
        &self,
        base_branch: &str,
    ) -> Result<Vec<PullRequest>> {
        let mut pulls = self
            .list_pulls(params::State::Closed, base_branch)
            .await?
            .into_iter()
            .filter(|pr| pr.merged_at.is_some())
            .collect::<Vec<GithubPullRequest>>();

        pulls.sort_by(|a, b| b.merged_at.cmp(&a.merged_at));

        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    async fn list_open_pull_requests(
        &self,
        base_branch: &str,
    ) -> Result<Vec<PullRequest>> {
        let pulls = self.list_pulls(params::State::Open, base_branch).await?;
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    async fn get_pull_request_files(
        &self,
        pr_number: u64,
    ) -> Result<Vec<String>> {
        let first = with_retry("list pull request files", || async move {
            self.instance
                .pulls(&self.config.owner, &self.config.repo)
                .list_files(pr_number)
                .await
                .map_err(MonoreleaseError::from)
        })
        .await?;

        let files: Vec<DiffEntry> =
            self.collect_pages("list pull request files", first).await?;

        Ok(files.into_iter().map(|f| f.filename).collect())
    }

    async fn create_pull_request(
        &self,
        req: CreatePrRequest,
    ) -> Result<PullRequest> {
        self.push_release_branch(
            &req.head_branch,
            &req.base_branch,
            &req.title,
            req.file_changes.clone(),
        )
        .await?;

        let request = &req;

        let pr = with_retry("create pull request", || async move {
            self.instance
                .pulls(&self.config.owner, &self.config.repo)
                .create(
                    &request.title,
                    &request.head_branch,
                    &request.base_branch,
                )
                .body(&request.body)
                .send()
                .await
                .map_err(MonoreleaseError::from)
        })
        .await?;

        info!("created pull request #{}", pr.number);

        let number = pr.number;

        if !req.labels.is_empty() {
            self.add_labels(PrLabelsRequest {
                pr_number: number,
                labels: req.labels.clone(),
            })
            .await?;
        }

        let mut created = PullRequest::from(pr);
        created.labels = req.labels;

        Ok(created)
    }

    async fn update_pull_request(&self, req: UpdatePrRequest) -> Result<()> {
        self.push_release_branch(
            &req.head_branch,
            &req.base_branch,
            &req.title,
            req.file_changes.clone(),
        )
        .await?;

        let request = &req;

        with_retry("update pull request", || async move {
            self.instance
                .pulls(&self.config.owner, &self.config.repo)
                .update(request.pr_number)
                .title(&request.title)
                .body(&request.body)
                .send()
                .await
                .map_err(MonoreleaseError::from)
        })
        .await?;

        info!("updated pull request #{}", req.pr_number);

        Ok(())
    }

    async fn close_pull_request(&self, pr_number: u64) -> Result<()> {
        with_retry("close pull request", || async move {
            self.instance
                .pulls(&self.config.owner, &self.config.repo)
                .update(pr_number)
                .state(params::pulls::State::Closed)
                .send()
                .await
                .map_err(MonoreleaseError::from)
        })
        .await?;

        info!("closed pull request #{pr_number}");

        Ok(())
    }

    async fn create_release(
        &self,
        req: CreateReleaseRequest,
    ) -> Result<Release> {
        let request = &req;

        let result = with_retry("create release", || async move {
            self.instance
                .repos(&self.config.owner, &self.config.repo)
                .releases()
                .create(&request.tag)
                .name(&request.name)
                .body(&request.notes)
                .target_commitish(&request.sha)
                .draft(request.draft)
                .prerelease(request.prerelease)
                .send()
                .await
                .map_err(MonoreleaseError::from)
        })
        .await;

        match result {
            Ok(release) => Ok(Release {
                tag: req.tag,
                url: release.html_url.to_string(),
            }),
            Err(MonoreleaseError::DuplicateRelease(_)) => {
                Err(MonoreleaseError::DuplicateRelease(req.tag))
            }
            Err(err) => Err(err),
        }
    }

    async fn add_labels(&self, req: PrLabelsRequest) -> Result<()> {
        let pr_number = req.pr_number;
        let labels = &req.labels;
        with_retry("add labels", || async move {
            self.instance
                .issues(&self.config.owner, &self.config.repo)
                .add_labels(pr_number, labels)
                .await
                .map(|_| ())
                .map_err(MonoreleaseError::from)
        })
        .await
    }

    async fn remove_labels(&self, req: PrLabelsRequest) -> Result<()> {
        let pr_number = req.pr_number;
        for label in req.labels.iter() {
            let result = with_retry("remove label", || async move {
                self.instance
                    .issues(&self.config.owner, &self.config.repo)
                    .remove_label(pr_number, label)
                    .await
                    .map(|_| ())
                    .map_err(MonoreleaseError::from)
            })
            .await;

            match result {
                Ok(()) => {}
                Err(MonoreleaseError::NotFound(_)) => {
                    debug!("label {label} not present on #{pr_number}")
                }
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    async fn comment_on_issue(
        &self,
        issue_number: u64,
        body: &str,
    ) -> Result<()> {
        with_retry("comment on issue", || async move {
            self.instance
                .issues(&self.config.owner, &self.config.repo)
                .create_comment(issue_number, body)
                .await
                .map(|_| ())
                .map_err(MonoreleaseError::from)
        })
        .await
    }
}
