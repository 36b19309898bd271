//! Attributes commits to the packages whose files they touch.
use log::*;
use std::collections::BTreeMap;

use crate::{
    MonoreleaseError, Result,
    forge::request::ForgeCommit,
    path_helpers::{is_under, normalize_package_path, normalize_path},
};

/// Options used to construct a [`CommitSplit`]
#[derive(Debug, Clone, Default)]
pub struct SplitOptions {
    /// Append commits that touch no files to every bucket that already holds
    /// at least one commit. Used to carry `release-as` footers attached to
    /// empty commits.
    pub include_empty: bool,
    /// Configured package paths. When `None` the first path segment of each
    /// file is used as its owning package.
    pub package_paths: Option<Vec<String>>,
}

/// Splits a list of commits into per package buckets
#[derive(Debug, Clone)]
pub struct CommitSplit {
    include_empty: bool,
    /// Normalized, longest first
    package_paths: Option<Vec<String>>,
}

impl CommitSplit {
    /// Fails with a configuration error if two package paths overlap after
    /// normalization. The root package "." is dropped: it always receives the
    /// unfiltered commit list from the caller.
    pub fn new(options: SplitOptions) -> Result<Self> {
        let package_paths = match options.package_paths {
            None => None,
            Some(paths) => {
                let mut normalized = paths
                    .iter()
                    .map(|p| normalize_package_path(p))
                    .filter(|p| p != ".")
                    .collect::<Vec<String>>();

                for (i, a) in normalized.iter().enumerate() {
                    for b in normalized.iter().skip(i + 1) {
                        if is_under(a, b) || is_under(b, a) {
                            return Err(MonoreleaseError::invalid_config(
                                format!(
                                    "package paths may not overlap: \"{a}\" and \"{b}\""
                                ),
                            ));
                        }
                    }
                }

                normalized.sort_by(|a, b| b.len().cmp(&a.len()));

                Some(normalized)
            }
        };

        Ok(Self {
            include_empty: options.include_empty,
            package_paths,
        })
    }

    /// Package path owning `file`, if any
    fn owner_of(&self, file: &str) -> Option<String> {
        let file = normalize_path(file);
        let file = file.trim_start_matches('/');

        match &self.package_paths {
            Some(paths) => paths.iter().find(|p| is_under(file, p)).cloned(),
            None => {
                let (first, rest) = file.split_once('/')?;
                if first.is_empty() || rest.is_empty() {
                    return None;
                }
                Some(first.to_string())
            }
        }
    }

    /// Buckets commits by owning package. Each commit appears in a bucket at
    /// most once and buckets preserve the input order.
    pub fn split(
        &self,
        commits: &[ForgeCommit],
    ) -> BTreeMap<String, Vec<ForgeCommit>> {
        let mut buckets: BTreeMap<String, Vec<ForgeCommit>> = BTreeMap::new();

        for commit in commits.iter() {
            if commit.files.is_empty() {
                if self.include_empty {
                    for bucket in buckets.values_mut() {
                        bucket.push(commit.clone());
                    }
                }
                continue;
            }

            let mut owners: Vec<String> = vec![];

            for file in commit.files.iter() {
                if let Some(owner) = self.owner_of(file)
                    && !owners.contains(&owner)
                {
                    owners.push(owner);
                }
            }

            for owner in owners {
                buckets.entry(owner).or_default().push(commit.clone());
            }
        }

        debug!(
            "split {} commits into {} packages",
            commits.len(),
            buckets.len()
        );

        buckets
    }
}
