//! File updaters that rewrite package manifests, changelogs and extra files
//! for a release.
//!
//! Updaters never read or write files themselves: they receive the current
//! content (or `None` when the file does not exist) and return the new
//! content, or `None` to leave the file untouched.
use semver::Version;
use std::collections::BTreeMap;

use crate::{
    Result,
    analyzer::ReleaseCandidate,
    config::{package::PackageConfig, release_type::ReleaseType},
    updater::{
        changelog::ChangelogUpdater,
        generic::GenericUpdater,
        node::{NodeFile, NodeUpdater},
        python::PyProjectUpdater,
        rust::CargoTomlUpdater,
    },
};

pub mod changelog;
pub mod generic;
pub mod node;
pub mod python;
pub mod rust;

/// Every supported updater
#[derive(Debug, Clone)]
pub enum Updater {
    Generic(GenericUpdater),
    Node(NodeUpdater),
    Rust(CargoTomlUpdater),
    Python(PyProjectUpdater),
    Changelog(ChangelogUpdater),
}

impl Updater {
    pub fn update_content(&self, old: Option<&str>) -> Result<Option<String>> {
        match self {
            Updater::Generic(updater) => updater.update_content(old),
            Updater::Node(updater) => updater.update_content(old),
            Updater::Rust(updater) => updater.update_content(old),
            Updater::Python(updater) => updater.update_content(old),
            Updater::Changelog(updater) => updater.update_content(old),
        }
    }
}

/// A repository relative file and the updater that rewrites it
#[derive(Debug, Clone)]
pub struct FileUpdate {
    pub path: String,
    pub updater: Updater,
}

impl FileUpdate {
    fn new(path: String, updater: Updater) -> Self {
        Self { path, updater }
    }
}

/// Name used by other packages to depend on `package`
pub fn dependency_name(package: &PackageConfig) -> &str {
    package
        .package_name
        .as_deref()
        .unwrap_or(package.component.as_str())
}

/// Next versions of every released package keyed by dependency name
pub fn released_versions(
    packages: &[PackageConfig],
    candidates: &[ReleaseCandidate],
) -> BTreeMap<String, Version> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let package = packages.iter().find(|p| p.path == candidate.path)?;
            Some((
                dependency_name(package).to_string(),
                candidate.next_version.clone(),
            ))
        })
        .collect()
}

/// Files rewritten when releasing `candidate`: the changelog, the manifests
/// owned by the release type and any configured extra files.
pub fn file_updates(
    package: &PackageConfig,
    candidate: &ReleaseCandidate,
    released: &BTreeMap<String, Version>,
) -> Vec<FileUpdate> {
    let version = &candidate.next_version;

    let mut siblings = released.clone();
    siblings.remove(dependency_name(package));

    let mut updates = vec![];

    if !package.skip_changelog {
        updates.push(FileUpdate::new(
            package.changelog_file(),
            Updater::Changelog(ChangelogUpdater::new(
                candidate.changelog_entry.clone(),
            )),
        ));
    }

    match package.release_type {
        ReleaseType::Generic => {}
        ReleaseType::Node => {
            updates.push(FileUpdate::new(
                package.file("package.json"),
                Updater::Node(NodeUpdater::new(
                    NodeFile::PackageJson,
                    version,
                    siblings,
                )),
            ));
            updates.push(FileUpdate::new(
                package.file("package-lock.json"),
                Updater::Node(NodeUpdater::new(
                    NodeFile::PackageLock,
                    version,
                    BTreeMap::new(),
                )),
            ));
        }
        ReleaseType::Rust => {
            updates.push(FileUpdate::new(
                package.file("Cargo.toml"),
                Updater::Rust(CargoTomlUpdater::new(version, siblings)),
            ));
        }
        ReleaseType::Python => {
            updates.push(FileUpdate::new(
                package.file("pyproject.toml"),
                Updater::Python(PyProjectUpdater::new(version)),
            ));
        }
    }

    for extra in package.extra_files.iter() {
        updates.push(FileUpdate::new(
            package.file(&extra.path),
            Updater::Generic(GenericUpdater::new(
                version,
                extra.version_regex.clone(),
            )),
        ));
    }

    updates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::package::{ExtraFile, PackageConfigBuilder},
        test_helpers::create_test_package,
    };

    fn candidate(
        path: &str,
        component: &str,
        version: &str,
    ) -> ReleaseCandidate {
        ReleaseCandidate {
            path: path.into(),
            component: component.into(),
            prior_version: None,
            next_version: Version::parse(version).unwrap(),
            commits: vec![],
            changelog_entry: "## entry".into(),
        }
    }

    #[test]
    fn node_package_updates_changelog_manifests_and_extra_files() {
        let package = PackageConfigBuilder::default()
            .path("packages/web")
            .component("web")
            .release_type(ReleaseType::Node)
            .extra_files(vec![ExtraFile {
                path: "src/version.ts".into(),
                version_regex: None,
            }])
            .build()
            .unwrap();
        let candidate = candidate("packages/web", "web", "1.2.0");

        let paths = file_updates(&package, &candidate, &BTreeMap::new())
            .into_iter()
            .map(|u| u.path)
            .collect::<Vec<String>>();

        assert_eq!(
            paths,
            vec![
                "packages/web/CHANGELOG.md",
                "packages/web/package.json",
                "packages/web/package-lock.json",
                "packages/web/src/version.ts",
            ]
        );
    }

    #[test]
    fn skip_changelog_omits_changelog() {
        let package = PackageConfigBuilder::default()
            .path("crates/core")
            .component("core")
            .release_type(ReleaseType::Rust)
            .skip_changelog(true)
            .build()
            .unwrap();
        let candidate = candidate("crates/core", "core", "0.3.0");

        let updates = file_updates(&package, &candidate, &BTreeMap::new());

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].path, "crates/core/Cargo.toml");
        assert!(matches!(updates[0].updater, Updater::Rust(_)));
    }

    #[test]
    fn released_versions_use_package_name_or_component() {
        let packages = vec![
            PackageConfigBuilder::default()
                .path("packages/api")
                .component("api")
                .package_name("@acme/api")
                .build()
                .unwrap(),
            create_test_package("packages/web", "web"),
        ];
        let candidates = vec![
            candidate("packages/api", "api", "1.1.0"),
            candidate("packages/web", "web", "2.0.0"),
        ];

        let versions = released_versions(&packages, &candidates);

        assert_eq!(versions["@acme/api"].to_string(), "1.1.0");
        assert_eq!(versions["web"].to_string(), "2.0.0");
    }

    #[test]
    fn changelog_update_prepends_entry() {
        let package = create_test_package(".", "root");
        let candidate = candidate(".", "root", "1.0.0");

        let updates = file_updates(&package, &candidate, &BTreeMap::new());
        let content = updates[0].updater.update_content(None).unwrap();

        assert_eq!(updates[0].path, "CHANGELOG.md");
        assert_eq!(content, Some("# Changelog\n\n## entry\n".into()));
    }
}
