use derive_builder::Builder;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Builder)]
#[builder(setter(into), default)]
/// Represents a normalized commit returned from any forge
pub struct ForgeCommit {
    pub id: String,
    pub short_id: String,
    pub link: String,
    pub message: String,
    pub timestamp: i64,
    /// Repository relative paths touched by this commit
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Pull request as seen by the orchestrator.
pub struct PullRequest {
    pub number: u64,
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    /// Merge commit sha, only present for merged pull requests
    pub merge_commit_sha: Option<String>,
}

impl PullRequest {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to read a file at a git ref. `None` means the tip of the default
/// branch.
pub struct GetFileContentRequest {
    pub git_ref: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to list commits on a branch, newest first, stopping before
/// `since_sha` when provided.
pub struct ListCommitsRequest {
    pub branch: String,
    pub since_sha: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    /// Relative path to the file starting from repo root
    pub path: String,
    /// Full contents of the file after the change. Files are only ever created
    /// or updated by a release pull request, never deleted.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to create a new pull request whose head branch is (re)written to
/// contain `file_changes` on top of `base_branch`.
pub struct CreatePrRequest {
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
    pub file_changes: Vec<FileChange>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to update an existing pull request in place.
pub struct UpdatePrRequest {
    pub pr_number: u64,
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
    pub file_changes: Vec<FileChange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to add or remove pull request labels.
pub struct PrLabelsRequest {
    pub pr_number: u64,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReleaseRequest {
    pub name: String,
    pub tag: String,
    pub sha: String,
    pub notes: String,
    pub draft: bool,
    pub prerelease: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub tag: String,
    pub url: String,
}
