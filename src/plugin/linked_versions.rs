//! Keeps a group of components on the same version.
//!
//! ```json
//! { "type": "linked-versions", "groupName": "core", "components": ["api", "web"] }
//! ```
use log::*;
use serde::Deserialize;

use crate::{
    MonoreleaseError, Result,
    analyzer::{ReleaseCandidate, commit::Commit},
    config::{PluginSpec, package::PackageConfig},
    forge::request::ForgeCommit,
    manifest::VersionManifest,
    plugin::{Plugin, parse_options},
};

pub const NAME: &str = "linked-versions";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Options {
    group_name: String,
    components: Vec<String>,
}

/// Every member of the group is released at the highest version proposed
/// for any member. Members without changes get a synthetic candidate.
#[derive(Debug, Clone)]
pub struct LinkedVersions {
    group_name: String,
    /// (path, component) of each member
    members: Vec<(String, String)>,
}

impl LinkedVersions {
    pub fn from_spec(
        spec: &PluginSpec,
        packages: &[PackageConfig],
    ) -> Result<Plugin> {
        let options: Options = parse_options(spec)?;

        let mut members = vec![];

        for component in options.components.iter() {
            let package = packages
                .iter()
                .find(|p| &p.component == component)
                .ok_or_else(|| {
                    MonoreleaseError::invalid_config(format!(
                        "{NAME} group \"{}\" references unknown component \"{component}\"",
                        options.group_name
                    ))
                })?;
            members.push((package.path.clone(), package.component.clone()));
        }

        Ok(Plugin::LinkedVersions(Self {
            group_name: options.group_name,
            members,
        }))
    }

    fn is_member(&self, path: &str) -> bool {
        self.members.iter().any(|(p, _)| p == path)
    }

    pub fn run(
        &self,
        mut versions: VersionManifest,
        mut candidates: Vec<ReleaseCandidate>,
    ) -> Result<(VersionManifest, Vec<ReleaseCandidate>)> {
        let Some(max) = candidates
            .iter()
            .filter(|c| self.is_member(&c.path))
            .map(|c| c.next_version.clone())
            .max()
        else {
            return Ok((versions, candidates));
        };

        info!("{NAME}: releasing group {} at {max}", self.group_name);

        let members =
            candidates.iter_mut().filter(|c| self.is_member(&c.path));

        for candidate in members {
            candidate.next_version = max.clone();
        }

        for (path, component) in self.members.iter() {
            if candidates.iter().any(|c| &c.path == path) {
                continue;
            }

            let prior = versions.get(path).cloned();

            if prior.as_ref().is_some_and(|p| p >= &max) {
                continue;
            }

            debug!("{NAME}: adding synthetic candidate for {path}");

            candidates.push(ReleaseCandidate {
                path: path.clone(),
                component: component.clone(),
                prior_version: prior,
                next_version: max.clone(),
                commits: vec![Commit::parse(&ForgeCommit {
                    message: format!(
                        "chore: synchronize {} versions",
                        self.group_name
                    ),
                    ..ForgeCommit::default()
                })],
                changelog_entry: "".into(),
            });
        }

        for candidate in candidates.iter().filter(|c| self.is_member(&c.path)) {
            versions.insert(candidate.path.clone(), max.clone());
        }

        Ok((versions, candidates))
    }
}
