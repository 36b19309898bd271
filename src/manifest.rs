//! Resolution of the `path → last released version` manifest.
//!
//! The manifest lives in the repository and is rewritten by every release
//! pull request. Reads fall back from a specific commit to the tip of the
//! target branch when the snapshot is missing.
use log::*;
use semver::Version;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::{
    MonoreleaseError, Result,
    codec::BranchName,
    config::{DEFAULT_MANIFEST_FILE, resolver::ResolvedConfig},
    forge::{manager::ForgeManager, request::GetFileContentRequest},
    path_helpers::normalize_package_path,
};

/// Last released version per normalized package path
pub type VersionManifest = BTreeMap<String, Version>;

/// Snapshot a manifest was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAt {
    /// Tip of the target branch
    Tip,
    /// A specific commit
    Sha(String),
}

/// Parses manifest content. The manifest must be a flat JSON object whose
/// values are all semantic version strings; a single bad entry invalidates
/// the whole manifest.
pub fn parse_manifest(content: &str) -> Result<VersionManifest> {
    let value: Value = serde_json::from_str(content).map_err(|e| {
        MonoreleaseError::invalid_config(format!(
            "{DEFAULT_MANIFEST_FILE} is not valid JSON: {e}"
        ))
    })?;

    let Value::Object(entries) = value else {
        return Err(MonoreleaseError::invalid_config(format!(
            "{DEFAULT_MANIFEST_FILE} must be a JSON object"
        )));
    };

    let mut manifest = VersionManifest::new();

    for (path, value) in entries {
        let Value::String(raw) = value else {
            return Err(MonoreleaseError::invalid_config(format!(
                "{DEFAULT_MANIFEST_FILE}: version for \"{path}\" must be a string"
            )));
        };

        let version = Version::parse(&raw).map_err(|e| {
            MonoreleaseError::invalid_config(format!(
                "{DEFAULT_MANIFEST_FILE}: invalid version \"{raw}\" for \"{path}\": {e}"
            ))
        })?;

        manifest.insert(normalize_package_path(&path), version);
    }

    Ok(manifest)
}

/// Pretty printed manifest with a trailing newline
pub fn serialize_manifest(manifest: &VersionManifest) -> Result<String> {
    let entries = manifest
        .iter()
        .map(|(path, version)| {
            (path.clone(), Value::String(version.to_string()))
        })
        .collect::<Map<String, Value>>();

    let content = serde_json::to_string_pretty(&Value::Object(entries))?;
    Ok(format!("{content}\n"))
}

/// Reads manifests and release history through the forge
pub struct ManifestResolver<'a> {
    forge: &'a ForgeManager,
    config: &'a ResolvedConfig,
    target_branch: String,
}

impl<'a> ManifestResolver<'a> {
    pub fn new(
        forge: &'a ForgeManager,
        config: &'a ResolvedConfig,
        target_branch: impl Into<String>,
    ) -> Self {
        Self {
            forge,
            config,
            target_branch: target_branch.into(),
        }
    }

    async fn fetch(&self, git_ref: &str) -> Result<Option<VersionManifest>> {
        let content = self
            .forge
            .get_file_content(GetFileContentRequest {
                git_ref: Some(git_ref.to_string()),
                path: DEFAULT_MANIFEST_FILE.to_string(),
            })
            .await?;

        content.as_deref().map(parse_manifest).transpose()
    }

    /// The tip manifest, if present, must parse
    pub async fn validate(&self) -> Result<()> {
        match self.fetch(&self.target_branch).await? {
            Some(manifest) => {
                debug!("manifest is valid with {} entries", manifest.len());
            }
            None => {
                info!(
                    "no {DEFAULT_MANIFEST_FILE} on {}: every package is new",
                    self.target_branch
                )
            }
        }
        Ok(())
    }

    /// Commit the previous release was cut from: the configured
    /// `last-release-sha`, the merge commit of the most recently merged
    /// release pull request, the configured `bootstrap-sha`, or `None` for
    /// the beginning of history.
    ///
    /// With `component` set only release pull requests that could have
    /// released that component are considered.
    pub async fn last_release_sha(
        &self,
        component: Option<&str>,
    ) -> Result<Option<String>> {
        if let Some(sha) = &self.config.last_release_sha {
            debug!("using configured last-release-sha: {sha}");
            return Ok(Some(sha.clone()));
        }

        let target = self.target_branch.as_str();

        let merged = self
            .forge
            .find_merged_pr(target, |pr| {
                let Some(branch) = BranchName::parse(&pr.head_branch) else {
                    return false;
                };
                if !branch.targets(target) {
                    return false;
                }
                match (component, branch.component()) {
                    (Some(wanted), Some(found)) => wanted == found,
                    _ => true,
                }
            })
            .await?;

        if let Some(sha) = merged.and_then(|pr| pr.merge_commit_sha) {
            debug!("last release pull request merged at {sha}");
            return Ok(Some(sha));
        }

        if let Some(sha) = &self.config.bootstrap_sha {
            debug!("no release found: using bootstrap-sha {sha}");
            return Ok(Some(sha.clone()));
        }

        debug!("no release found: searching from the beginning of history");
        Ok(None)
    }

    /// Manifest snapshot at `at_sha`, or at the tip when `None`.
    ///
    /// A missing snapshot falls back to the tip. Configured packages absent
    /// from a commit snapshot get one lookup against the tip; packages
    /// missing from both are new.
    pub async fn resolve_versions(
        &self,
        at_sha: Option<&str>,
    ) -> Result<(VersionManifest, ResolvedAt)> {
        let Some(sha) = at_sha else {
            let manifest = self.fetch(&self.target_branch).await?;
            return Ok((manifest.unwrap_or_default(), ResolvedAt::Tip));
        };

        let Some(mut manifest) = self.fetch(sha).await? else {
            warn!(
                "{DEFAULT_MANIFEST_FILE} not found at {sha}: falling back to the tip of {}",
                self.target_branch
            );
            let manifest = self.fetch(&self.target_branch).await?;
            return Ok((manifest.unwrap_or_default(), ResolvedAt::Tip));
        };

        let missing = self
            .config
            .packages
            .iter()
            .map(|p| p.path.clone())
            .filter(|path| !manifest.contains_key(path))
            .collect::<Vec<String>>();

        if !missing.is_empty() {
            debug!("looking up {missing:?} in the tip manifest");

            let tip = self
                .fetch(&self.target_branch)
                .await?
                .unwrap_or_default();

            for path in missing {
                match tip.get(&path) {
                    Some(version) => {
                        manifest.insert(path, version.clone());
                    }
                    None => info!("{path} has no released version: new package"),
                }
            }
        }

        Ok((manifest, ResolvedAt::Sha(sha.to_string())))
    }
}
