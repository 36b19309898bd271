//! Configuration resolver using builder pattern.
//!
//! Transforms raw [`Config`] from `monorelease-config.json` into fully
//! resolved package configuration by merging shared defaults, deriving
//! components and validating inputs.
//!
//! ## Resolution Precedence (highest to lowest)
//!
//! 1. Package-level config from file
//! 2. Shared top level config from file
//! 3. Repository defaults (component from the repo name)
//! 4. Built-in defaults

use derive_builder::Builder;
use regex::Regex;
use semver::Version;
use std::{collections::BTreeSet, sync::LazyLock};

use crate::{
    MonoreleaseError, Result,
    analyzer::changelog::DEFAULT_TEMPLATE,
    config::{
        Config, PluginSpec,
        package::{
            DEFAULT_CHANGELOG_PATH, ExtraFile, ExtraFileSpec, PackageConfig,
            PackageOverrides,
        },
    },
    forge::config::{PENDING_LABEL, TAGGED_LABEL},
    path_helpers::normalize_package_path,
};

static SHA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{7,40}$").unwrap());

/// Configuration after defaults are applied and every value validated
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Sorted by path
    pub packages: Vec<PackageConfig>,
    pub plugins: Vec<PluginSpec>,
    pub last_release_sha: Option<String>,
    pub bootstrap_sha: Option<String>,
    pub separate_pull_requests: bool,
    pub pending_labels: Vec<String>,
    pub tagged_labels: Vec<String>,
    pub changelog_template: String,
}

impl ResolvedConfig {
    pub fn package(&self, path: &str) -> Option<&PackageConfig> {
        self.packages.iter().find(|p| p.path == path)
    }

    pub fn package_paths(&self) -> Vec<String> {
        self.packages.iter().map(|p| p.path.clone()).collect()
    }
}

/// Resolves configuration by applying all resolution logic.
#[derive(Builder)]
#[builder(setter(into))]
pub struct ConfigResolver {
    config: Config,
    repo_name: String,
}

impl ConfigResolver {
    /// Resolves the configuration. Fails with a configuration error before
    /// anything touches the forge.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let config = &self.config;

        if config.packages.is_empty() {
            return Err(MonoreleaseError::invalid_config(
                "at least one package must be configured",
            ));
        }

        let multi_package = config.packages.len() > 1;
        let mut packages = Vec::with_capacity(config.packages.len());

        for (path, overrides) in config.packages.iter() {
            let merged = overrides.merged_with(&config.defaults);
            packages.push(self.resolve_package(path, merged, multi_package)?);
        }

        packages.sort_by(|a, b| a.path.cmp(&b.path));

        Self::validate_unique(&packages)?;

        let last_release_sha =
            Self::validate_sha("last-release-sha", &config.last_release_sha)?;
        let bootstrap_sha =
            Self::validate_sha("bootstrap-sha", &config.bootstrap_sha)?;

        let changelog_template = config
            .changelog_template
            .clone()
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

        Ok(ResolvedConfig {
            packages,
            plugins: config.plugins.clone(),
            last_release_sha,
            bootstrap_sha,
            separate_pull_requests: config.separate_pull_requests,
            pending_labels: Self::split_labels(&config.label, PENDING_LABEL),
            tagged_labels: Self::split_labels(
                &config.release_label,
                TAGGED_LABEL,
            ),
            changelog_template,
        })
    }

    fn resolve_package(
        &self,
        raw_path: &str,
        overrides: PackageOverrides,
        multi_package: bool,
    ) -> Result<PackageConfig> {
        let path = normalize_package_path(raw_path);

        let component = Self::resolve_component(
            &path,
            overrides.component.as_deref(),
            overrides.package_name.as_deref(),
            &self.repo_name,
        );

        let release_as =
            Self::parse_version(&path, "release-as", &overrides.release_as)?;
        let initial_version = Self::parse_version(
            &path,
            "initial-version",
            &overrides.initial_version,
        )?;

        let extra_files = Self::compile_extra_files(
            &path,
            overrides.extra_files.unwrap_or_default(),
        )?;

        let prerelease_type = overrides
            .prerelease_type
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(PackageConfig {
            path,
            release_type: overrides.release_type.unwrap_or_default(),
            package_name: overrides.package_name,
            component,
            bump_minor_pre_major: overrides
                .bump_minor_pre_major
                .unwrap_or(false),
            bump_patch_for_minor_pre_major: overrides
                .bump_patch_for_minor_pre_major
                .unwrap_or(false),
            release_as,
            changelog_path: overrides
                .changelog_path
                .unwrap_or_else(|| DEFAULT_CHANGELOG_PATH.to_string()),
            skip_changelog: overrides.skip_changelog.unwrap_or(false),
            extra_files,
            prerelease: overrides.prerelease.unwrap_or(false),
            prerelease_type,
            initial_version,
            draft: overrides.draft.unwrap_or(false),
            include_component_in_tag: overrides
                .include_component_in_tag
                .unwrap_or(multi_package),
            include_v_in_tag: overrides.include_v_in_tag.unwrap_or(true),
            skip_release: overrides.skip_release.unwrap_or(false),
        })
    }

    /// Explicit component, then the package name without its npm scope,
    /// then the last path segment. The root package falls back to the repo
    /// name.
    fn resolve_component(
        path: &str,
        component: Option<&str>,
        package_name: Option<&str>,
        repo_name: &str,
    ) -> String {
        if let Some(component) = component.filter(|c| !c.is_empty()) {
            return component.to_string();
        }

        if let Some(name) = package_name.filter(|n| !n.is_empty()) {
            let unscoped = name.rsplit('/').next().unwrap_or(name);
            return unscoped.to_string();
        }

        if path == "." {
            return repo_name.to_string();
        }

        path.rsplit('/').next().unwrap_or(path).to_string()
    }

    fn parse_version(
        path: &str,
        field: &str,
        value: &Option<String>,
    ) -> Result<Option<Version>> {
        let Some(raw) = value else {
            return Ok(None);
        };

        let trimmed = raw.trim().trim_start_matches('v');

        Version::parse(trimmed).map(Some).map_err(|e| {
            MonoreleaseError::invalid_config(format!(
                "invalid {field} \"{raw}\" for package \"{path}\": {e}"
            ))
        })
    }

    fn compile_extra_files(
        path: &str,
        specs: Vec<ExtraFileSpec>,
    ) -> Result<Vec<ExtraFile>> {
        let mut compiled = Vec::with_capacity(specs.len());

        for spec in specs {
            let version_regex = match spec.version_regex() {
                None => None,
                Some(pattern) => {
                    let regex = Regex::new(pattern).map_err(|e| {
                        MonoreleaseError::invalid_config(format!(
                            "invalid version-regex for extra file \"{}\" in package \"{path}\": {e}",
                            spec.path()
                        ))
                    })?;

                    let has_version_group = regex
                        .capture_names()
                        .any(|name| name == Some("version"));

                    if !has_version_group {
                        return Err(MonoreleaseError::invalid_config(format!(
                            "version-regex for \"{}\" must include a named capture group '(?<version>...)'",
                            spec.path()
                        )));
                    }

                    Some(regex)
                }
            };

            compiled.push(ExtraFile {
                path: spec.path().to_string(),
                version_regex,
            });
        }

        Ok(compiled)
    }

    /// Paths and components must be unique after normalization, otherwise
    /// branch names and tags would collide.
    fn validate_unique(packages: &[PackageConfig]) -> Result<()> {
        let mut paths = BTreeSet::new();
        let mut components = BTreeSet::new();

        for package in packages {
            if !paths.insert(package.path.as_str()) {
                return Err(MonoreleaseError::invalid_config(format!(
                    "package path \"{}\" is configured more than once",
                    package.path
                )));
            }

            if !components.insert(package.component.as_str()) {
                return Err(MonoreleaseError::invalid_config(format!(
                    "component \"{}\" is used by more than one package",
                    package.component
                )));
            }
        }

        Ok(())
    }

    fn validate_sha(
        field: &str,
        sha: &Option<String>,
    ) -> Result<Option<String>> {
        match sha {
            None => Ok(None),
            Some(sha) if SHA_REGEX.is_match(sha) => Ok(Some(sha.clone())),
            Some(sha) => Err(MonoreleaseError::invalid_config(format!(
                "{field} must be a 7 to 40 character hex sha, got \"{sha}\""
            ))),
        }
    }

    fn split_labels(raw: &Option<String>, default: &str) -> Vec<String> {
        let labels = raw
            .as_deref()
            .unwrap_or(default)
            .split(',')
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect::<Vec<String>>();

        if labels.is_empty() {
            vec![default.to_string()]
        } else {
            labels
        }
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod resolver_tests;
