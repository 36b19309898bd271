//! Configuration loading and parsing for `monorelease-config.json` files.
//!
//! Top level package settings act as shared defaults for every entry in
//! `packages`; package level values always win.
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::{MonoreleaseError, Result, config::package::PackageOverrides};

pub mod package;
pub mod release_type;
pub mod resolver;

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "monorelease-config.json";

/// Default manifest filename.
pub const DEFAULT_MANIFEST_FILE: &str = ".monorelease-manifest.json";

/// Plugin entry: either a bare registry name or an object with a `type`
/// key plus plugin specific options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PluginSpec {
    Name(String),
    Options {
        #[serde(rename = "type")]
        kind: String,
        #[serde(flatten)]
        options: Map<String, Value>,
    },
}

impl PluginSpec {
    pub fn kind(&self) -> &str {
        match self {
            PluginSpec::Name(name) => name,
            PluginSpec::Options { kind, .. } => kind,
        }
    }

    pub fn options(&self) -> Option<&Map<String, Value>> {
        match self {
            PluginSpec::Name(_) => None,
            PluginSpec::Options { options, .. } => Some(options),
        }
    }
}

/// Root configuration structure for `monorelease-config.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Packages keyed by path relative to the repository root
    pub packages: BTreeMap<String, PackageOverrides>,
    /// Package settings shared by every package
    #[serde(flatten)]
    pub defaults: PackageOverrides,
    pub plugins: Vec<PluginSpec>,
    /// Overrides the last release lookup entirely
    pub last_release_sha: Option<String>,
    /// Starting point used before the first release PR was merged
    pub bootstrap_sha: Option<String>,
    /// Open one release PR per package instead of an aggregate one
    pub separate_pull_requests: bool,
    /// Comma separated labels applied to open release PRs
    pub label: Option<String>,
    /// Comma separated labels applied once releases are tagged
    pub release_label: Option<String>,
    /// Tera template overriding the default changelog entry
    pub changelog_template: Option<String>,
}

impl Config {
    /// Parses raw JSON content. Any malformed content is a configuration
    /// error.
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|err| {
            MonoreleaseError::invalid_config(format!(
                "failed to parse {DEFAULT_CONFIG_FILE}: {err}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::release_type::ReleaseType;

    #[test]
    fn parses_packages_and_shared_defaults() {
        let content = r#"{
            "release-type": "node",
            "bump-minor-pre-major": true,
            "separate-pull-requests": true,
            "packages": {
                "packages/api": { "component": "api" },
                "packages/web": { "release-type": "rust" }
            }
        }"#;

        let config = Config::parse(content).unwrap();

        assert_eq!(config.packages.len(), 2);
        assert_eq!(config.defaults.release_type, Some(ReleaseType::Node));
        assert_eq!(config.defaults.bump_minor_pre_major, Some(true));
        assert!(config.separate_pull_requests);
        assert_eq!(
            config.packages["packages/web"].release_type,
            Some(ReleaseType::Rust)
        );
    }

    #[test]
    fn parses_plugin_names_and_objects() {
        let content = r#"{
            "packages": { ".": {} },
            "plugins": [
                "sentence-case",
                { "type": "linked-versions", "groupName": "core", "components": ["a", "b"] }
            ]
        }"#;

        let config = Config::parse(content).unwrap();

        assert_eq!(config.plugins.len(), 2);
        assert_eq!(config.plugins[0].kind(), "sentence-case");
        assert!(config.plugins[0].options().is_none());
        assert_eq!(config.plugins[1].kind(), "linked-versions");
        let options = config.plugins[1].options().unwrap();
        assert_eq!(options["groupName"], "core");
    }

    #[test]
    fn malformed_content_is_a_configuration_error() {
        let result = Config::parse("{ \"packages\": [1, 2] }");
        assert!(matches!(result, Err(MonoreleaseError::InvalidConfig(_))));

        let result = Config::parse("not json");
        assert!(matches!(result, Err(MonoreleaseError::InvalidConfig(_))));
    }
}
