use derive_builder::Builder;
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::{
    analyzer::version::VersionPolicy,
    codec::TagName,
    config::release_type::ReleaseType,
    path_helpers::package_file,
};

pub const DEFAULT_CHANGELOG_PATH: &str = "CHANGELOG.md";

/// Extra file specification that accepts either a string path or a full
/// config. Plain paths are updated on lines carrying a version marker; a
/// custom regex replaces its `version` capture group instead.
///
/// ```json
/// "extra-files": [
///   "VERSION",
///   { "path": "chart.yaml", "version-regex": "appVersion: (?<version>\\S+)" }
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraFileSpec {
    Path(String),
    Full {
        path: String,
        #[serde(default, rename = "version-regex")]
        version_regex: Option<String>,
    },
}

impl ExtraFileSpec {
    pub fn path(&self) -> &str {
        match self {
            ExtraFileSpec::Path(path) => path,
            ExtraFileSpec::Full { path, .. } => path,
        }
    }

    pub fn version_regex(&self) -> Option<&str> {
        match self {
            ExtraFileSpec::Path(_) => None,
            ExtraFileSpec::Full { version_regex, .. } => {
                version_regex.as_deref()
            }
        }
    }
}

/// Compiled extra file, populated during config resolution
#[derive(Debug, Clone)]
pub struct ExtraFile {
    /// Path relative to the package path
    pub path: String,
    pub version_regex: Option<Regex>,
}

/// Per package settings as written in the config file. Every field is
/// optional: unset values fall back to the shared defaults at the top level
/// of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PackageOverrides {
    pub release_type: Option<ReleaseType>,
    pub package_name: Option<String>,
    pub component: Option<String>,
    pub bump_minor_pre_major: Option<bool>,
    pub bump_patch_for_minor_pre_major: Option<bool>,
    pub release_as: Option<String>,
    pub changelog_path: Option<String>,
    pub skip_changelog: Option<bool>,
    pub extra_files: Option<Vec<ExtraFileSpec>>,
    pub prerelease: Option<bool>,
    pub prerelease_type: Option<String>,
    pub initial_version: Option<String>,
    pub draft: Option<bool>,
    pub include_component_in_tag: Option<bool>,
    pub include_v_in_tag: Option<bool>,
    pub skip_release: Option<bool>,
}

impl PackageOverrides {
    /// Values set on `self` win over `defaults`
    pub fn merged_with(&self, defaults: &PackageOverrides) -> PackageOverrides {
        PackageOverrides {
            release_type: self.release_type.or(defaults.release_type),
            package_name: self
                .package_name
                .clone()
                .or_else(|| defaults.package_name.clone()),
            component: self.component.clone(),
            bump_minor_pre_major: self
                .bump_minor_pre_major
                .or(defaults.bump_minor_pre_major),
            bump_patch_for_minor_pre_major: self
                .bump_patch_for_minor_pre_major
                .or(defaults.bump_patch_for_minor_pre_major),
            release_as: self
                .release_as
                .clone()
                .or_else(|| defaults.release_as.clone()),
            changelog_path: self
                .changelog_path
                .clone()
                .or_else(|| defaults.changelog_path.clone()),
            skip_changelog: self.skip_changelog.or(defaults.skip_changelog),
            extra_files: self
                .extra_files
                .clone()
                .or_else(|| defaults.extra_files.clone()),
            prerelease: self.prerelease.or(defaults.prerelease),
            prerelease_type: self
                .prerelease_type
                .clone()
                .or_else(|| defaults.prerelease_type.clone()),
            initial_version: self
                .initial_version
                .clone()
                .or_else(|| defaults.initial_version.clone()),
            draft: self.draft.or(defaults.draft),
            include_component_in_tag: self
                .include_component_in_tag
                .or(defaults.include_component_in_tag),
            include_v_in_tag: self
                .include_v_in_tag
                .or(defaults.include_v_in_tag),
            skip_release: self.skip_release.or(defaults.skip_release),
        }
    }
}

/// Fully resolved package configuration
#[derive(Debug, Clone, Builder)]
#[builder(setter(into, strip_option), default)]
pub struct PackageConfig {
    /// Normalized package path relative to the repository root, "." for the
    /// root package
    pub path: String,
    pub release_type: ReleaseType,
    /// Name written into ecosystem manifests
    pub package_name: Option<String>,
    /// Short token used in branch names, titles and tags
    pub component: String,
    pub bump_minor_pre_major: bool,
    pub bump_patch_for_minor_pre_major: bool,
    pub release_as: Option<Version>,
    /// Relative to the package path
    pub changelog_path: String,
    pub skip_changelog: bool,
    pub extra_files: Vec<ExtraFile>,
    pub prerelease: bool,
    pub prerelease_type: Option<String>,
    pub initial_version: Option<Version>,
    pub draft: bool,
    pub include_component_in_tag: bool,
    pub include_v_in_tag: bool,
    pub skip_release: bool,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            path: ".".into(),
            release_type: ReleaseType::default(),
            package_name: None,
            component: "".into(),
            bump_minor_pre_major: false,
            bump_patch_for_minor_pre_major: false,
            release_as: None,
            changelog_path: DEFAULT_CHANGELOG_PATH.into(),
            skip_changelog: false,
            extra_files: vec![],
            prerelease: false,
            prerelease_type: None,
            initial_version: None,
            draft: false,
            include_component_in_tag: false,
            include_v_in_tag: true,
            skip_release: false,
        }
    }
}

impl PackageConfig {
    pub fn version_policy(&self) -> VersionPolicy {
        VersionPolicy {
            bump_minor_pre_major: self.bump_minor_pre_major,
            bump_patch_for_minor_pre_major: self.bump_patch_for_minor_pre_major,
            release_as: self.release_as.clone(),
            prerelease: self.prerelease,
            prerelease_type: self.prerelease_type.clone(),
            initial_version: self.initial_version.clone(),
        }
    }

    pub fn tag_name(&self, version: &Version) -> TagName {
        let component = self
            .include_component_in_tag
            .then_some(self.component.as_str());
        TagName::new(component, version, self.include_v_in_tag)
    }

    /// Changelog path relative to the repository root
    pub fn changelog_file(&self) -> String {
        package_file(&self.path, &self.changelog_path)
    }

    /// Repository relative path of a file inside this package
    pub fn file(&self, relative: &str) -> String {
        package_file(&self.path, relative)
    }
}
