//! Capitalizes the first word of every commit description.
use serde::Deserialize;

use crate::{
    Result,
    analyzer::ReleaseCandidate,
    config::{PluginSpec, package::PackageConfig},
    manifest::VersionManifest,
    plugin::{Plugin, parse_options},
};

pub const NAME: &str = "sentence-case";

const DEFAULT_SPECIAL_WORDS: [&str; 3] = ["gRPC", "npm", "iOS"];

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Options {
    special_words: Option<Vec<String>>,
}

/// Descriptions starting with one of the special words are left as is.
#[derive(Debug, Clone)]
pub struct SentenceCase {
    special_words: Vec<String>,
}

impl SentenceCase {
    pub fn from_spec(
        spec: &PluginSpec,
        _packages: &[PackageConfig],
    ) -> Result<Plugin> {
        let options: Options = parse_options(spec)?;

        let special_words = options.special_words.unwrap_or_else(|| {
            DEFAULT_SPECIAL_WORDS.iter().map(|w| w.to_string()).collect()
        });

        Ok(Plugin::SentenceCase(Self { special_words }))
    }

    pub fn run(
        &self,
        versions: VersionManifest,
        mut candidates: Vec<ReleaseCandidate>,
    ) -> Result<(VersionManifest, Vec<ReleaseCandidate>)> {
        for candidate in candidates.iter_mut() {
            for commit in candidate.commits.iter_mut() {
                commit.description = self.to_sentence_case(&commit.description);
                if let Some(breaking) = commit.breaking_description.as_mut() {
                    *breaking = self.to_sentence_case(breaking);
                }
            }
        }

        Ok((versions, candidates))
    }

    fn to_sentence_case(&self, input: &str) -> String {
        let first_word = input.split_whitespace().next().unwrap_or_default();

        if self.special_words.iter().any(|w| w == first_word) {
            return input.to_string();
        }

        let mut chars = input.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analyzer::commit::Commit, forge::request::ForgeCommit};
    use semver::Version;

    fn candidate(messages: &[&str]) -> ReleaseCandidate {
        ReleaseCandidate {
            path: ".".into(),
            component: "root".into(),
            prior_version: None,
            next_version: Version::new(1, 0, 0),
            commits: messages
                .iter()
                .map(|m| {
                    Commit::parse(&ForgeCommit {
                        message: m.to_string(),
                        ..ForgeCommit::default()
                    })
                })
                .collect(),
            changelog_entry: "".into(),
        }
    }

    #[test]
    fn capitalizes_descriptions() {
        let plugin =
            SentenceCase::from_spec(&PluginSpec::Name(NAME.into()), &[])
                .unwrap();

        let (_, candidates) = plugin
            .run(
                VersionManifest::new(),
                vec![candidate(&[
                    "fix: handle empty input",
                    "feat: npm support",
                    "feat!: drop v1\n\nBREAKING CHANGE: removed the old api",
                ])],
            )
            .unwrap();

        let commits = &candidates[0].commits;
        assert_eq!(commits[0].description, "Handle empty input");
        assert_eq!(commits[1].description, "npm support");
        assert_eq!(
            commits[2].breaking_description,
            Some("Removed the old api".into())
        );
    }

    #[test]
    fn custom_special_words_replace_defaults() {
        let spec: PluginSpec = serde_json::from_str(
            r#"{ "type": "sentence-case", "specialWords": ["macOS"] }"#,
        )
        .unwrap();
        let plugin = SentenceCase::from_spec(&spec, &[]).unwrap();

        let (_, candidates) = plugin
            .run(
                VersionManifest::new(),
                vec![candidate(&["fix: macOS paths", "fix: npm paths"])],
            )
            .unwrap();

        let commits = &candidates[0].commits;
        assert_eq!(commits[0].description, "macOS paths");
        assert_eq!(commits[1].description, "Npm paths");
    }
}
