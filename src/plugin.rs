//! Post-processing plugins applied to release candidates before the pull
//! request is assembled.
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    MonoreleaseError, Result,
    analyzer::ReleaseCandidate,
    config::{PluginSpec, package::PackageConfig},
    manifest::VersionManifest,
    plugin::{linked_versions::LinkedVersions, sentence_case::SentenceCase},
};

pub mod linked_versions;
pub mod sentence_case;

type PluginFactory = fn(&PluginSpec, &[PackageConfig]) -> Result<Plugin>;

/// Plugins known by name
static REGISTRY: &[(&str, PluginFactory)] = &[
    (linked_versions::NAME, LinkedVersions::from_spec),
    (sentence_case::NAME, SentenceCase::from_spec),
];

#[derive(Debug, Clone)]
pub enum Plugin {
    LinkedVersions(LinkedVersions),
    SentenceCase(SentenceCase),
}

impl Plugin {
    /// Builds a plugin from its config entry. Unknown names and malformed
    /// options are configuration errors.
    pub fn from_spec(
        spec: &PluginSpec,
        packages: &[PackageConfig],
    ) -> Result<Self> {
        let (_, factory) = REGISTRY
            .iter()
            .find(|(name, _)| *name == spec.kind())
            .ok_or_else(|| {
                MonoreleaseError::invalid_config(format!(
                    "unknown plugin \"{}\"",
                    spec.kind()
                ))
            })?;

        factory(spec, packages)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Plugin::LinkedVersions(_) => linked_versions::NAME,
            Plugin::SentenceCase(_) => sentence_case::NAME,
        }
    }

    pub fn run(
        &self,
        versions: VersionManifest,
        candidates: Vec<ReleaseCandidate>,
    ) -> Result<(VersionManifest, Vec<ReleaseCandidate>)> {
        match self {
            Plugin::LinkedVersions(plugin) => plugin.run(versions, candidates),
            Plugin::SentenceCase(plugin) => plugin.run(versions, candidates),
        }
    }
}

/// Builds every configured plugin in order
pub fn build_plugins(
    specs: &[PluginSpec],
    packages: &[PackageConfig],
) -> Result<Vec<Plugin>> {
    specs
        .iter()
        .map(|spec| Plugin::from_spec(spec, packages))
        .collect()
}

/// Deserializes plugin options, treating a bare name as empty options
fn parse_options<T: DeserializeOwned>(spec: &PluginSpec) -> Result<T> {
    let options = spec
        .options()
        .cloned()
        .map(Value::Object)
        .unwrap_or_else(|| Value::Object(Default::default()));

    serde_json::from_value(options).map_err(|e| {
        MonoreleaseError::invalid_config(format!(
            "invalid options for plugin \"{}\": {e}",
            spec.kind()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_package;

    #[test]
    fn builds_plugins_from_registry() {
        let specs: Vec<PluginSpec> = serde_json::from_str(
            r#"[
                "sentence-case",
                { "type": "linked-versions", "groupName": "core", "components": ["api"] }
            ]"#,
        )
        .unwrap();
        let packages = vec![create_test_package("packages/api", "api")];

        let plugins = build_plugins(&specs, &packages).unwrap();

        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins[0].name(), "sentence-case");
        assert_eq!(plugins[1].name(), "linked-versions");
    }

    #[test]
    fn unknown_plugin_is_a_configuration_error() {
        let spec = PluginSpec::Name("node-workspace".into());

        let result = Plugin::from_spec(&spec, &[]);

        assert!(matches!(result, Err(MonoreleaseError::InvalidConfig(_))));
    }

    #[test]
    fn malformed_options_are_a_configuration_error() {
        let spec: PluginSpec = serde_json::from_str(
            r#"{ "type": "linked-versions", "components": "api" }"#,
        )
        .unwrap();

        let result = Plugin::from_spec(&spec, &[]);

        assert!(matches!(result, Err(MonoreleaseError::InvalidConfig(_))));
    }
}
