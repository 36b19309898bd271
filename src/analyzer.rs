//! Commit analysis, version detection, and changelog generation.
//!
//! Parses conventional commits, determines the next semantic version for a
//! package and renders its changelog entry using Tera templates.

use log::*;
use semver::Version;

use crate::{
    Result,
    analyzer::{
        changelog::{EntryContext, release_link, render_entry},
        commit::Commit,
        version::resolve_version,
    },
    config::package::PackageConfig,
    forge::request::ForgeCommit,
};

pub mod changelog;
pub mod commit;
pub mod group;
pub mod version;

/// Computed but not yet committed release of a single package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseCandidate {
    pub path: String,
    pub component: String,
    pub prior_version: Option<Version>,
    pub next_version: Version,
    /// Never empty
    pub commits: Vec<Commit>,
    pub changelog_entry: String,
}

/// Analyzes commits using conventional commit patterns to determine version
/// bumps and generate changelog entries.
pub struct Analyzer {
    template: String,
    repo_url: String,
}

impl Analyzer {
    /// `repo_url` is the browsable repository url used for compare links.
    pub fn new(
        template: impl Into<String>,
        repo_url: impl Into<String>,
    ) -> Self {
        Self {
            template: template.into(),
            repo_url: repo_url.into(),
        }
    }

    /// Computes the release candidate for `package`. Returns `None` when
    /// there are no commits, or when nothing user facing changed and the
    /// version was not forced by a `release-as` directive or config.
    pub fn resolve(
        &self,
        package: &PackageConfig,
        prior: Option<&Version>,
        commits: &[ForgeCommit],
    ) -> Result<Option<ReleaseCandidate>> {
        if commits.is_empty() {
            return Ok(None);
        }

        let parsed = commits.iter().map(Commit::parse).collect::<Vec<Commit>>();

        let messages = commits
            .iter()
            .map(|c| c.message.as_str())
            .collect::<Vec<&str>>();

        let resolution =
            resolve_version(prior, &messages, &package.version_policy())?;

        if !resolution.forced && !parsed.iter().any(|c| c.user_facing) {
            info!(
                "{}: no user facing changes in {} commits: skipping",
                package.path,
                parsed.len()
            );
            return Ok(None);
        }

        info!(
            "{}: next version {} (previous: {})",
            package.path,
            resolution.version,
            prior.map(|p| p.to_string()).unwrap_or("none".into())
        );

        let mut candidate = ReleaseCandidate {
            path: package.path.clone(),
            component: package.component.clone(),
            prior_version: resolution.previous,
            next_version: resolution.version,
            commits: parsed,
            changelog_entry: "".into(),
        };

        candidate.changelog_entry = self.render(package, &candidate)?;

        Ok(Some(candidate))
    }

    /// Renders the changelog entry for a candidate. Called again after the
    /// plugin pipeline since plugins may change versions and commits.
    pub fn render(
        &self,
        package: &PackageConfig,
        candidate: &ReleaseCandidate,
    ) -> Result<String> {
        let next_tag = package.tag_name(&candidate.next_version).to_string();
        let previous_tag = candidate
            .prior_version
            .as_ref()
            .map(|v| package.tag_name(v).to_string());

        let link =
            release_link(&self.repo_url, previous_tag.as_deref(), &next_tag);

        let context = EntryContext::new(
            candidate.next_version.to_string(),
            candidate.prior_version.as_ref().map(|v| v.to_string()),
            &candidate.component,
            link,
            &candidate.commits,
        );

        render_entry(&self.template, &context)
    }
}
