use git_conventional::Commit as ConventionalCommit;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::{analyzer::group::Group, forge::request::ForgeCommit};

// Subject line produced by `git revert`
static GIT_REVERT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^Revert "(?<subject>.+)"$"#).unwrap());

/// Parsed commit with conventional commit information and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub id: String,
    pub short_id: String,
    pub link: String,
    pub group: Group,
    pub scope: Option<String>,
    pub description: String,
    pub body: Option<String>,
    pub breaking: bool,
    pub breaking_description: Option<String>,
    pub user_facing: bool,
    #[serde(skip)]
    pub raw_message: String,
}

impl Commit {
    /// Parses a forge commit. Messages that do not follow the conventional
    /// format are kept as [`Group::Miscellaneous`], or [`Group::Revert`] for
    /// `git revert` subjects.
    pub fn parse(forge_commit: &ForgeCommit) -> Self {
        let raw_message = forge_commit.message.trim_end();

        let (group, scope, description, body, breaking, breaking_description) =
            match ConventionalCommit::parse(raw_message) {
                Ok(cc) => {
                    let group = if cc.breaking() {
                        Group::Breaking
                    } else {
                        Group::from_type(cc.type_().as_str())
                    };
                    (
                        group,
                        cc.scope().map(|s| s.to_string()),
                        cc.description().to_string(),
                        cc.body().map(|b| b.to_string()),
                        cc.breaking(),
                        cc.breaking_description().map(|d| d.to_string()),
                    )
                }
                Err(_) => {
                    let (subject, body) = match raw_message.split_once('\n') {
                        Some((subject, body)) => {
                            let body = body.trim();
                            (
                                subject.trim().to_string(),
                                (!body.is_empty()).then(|| body.to_string()),
                            )
                        }
                        None => (raw_message.trim().to_string(), None),
                    };

                    let group = if GIT_REVERT_REGEX.is_match(&subject) {
                        Group::Revert
                    } else {
                        Group::Miscellaneous
                    };

                    (group, None, subject, body, false, None)
                }
            };

        Self {
            id: forge_commit.id.clone(),
            short_id: forge_commit.short_id.clone(),
            link: forge_commit.link.clone(),
            user_facing: group.user_facing(),
            group,
            scope,
            description,
            body,
            breaking,
            breaking_description,
            raw_message: raw_message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forge_commit(message: &str) -> ForgeCommit {
        ForgeCommit {
            id: "abc123def456".into(),
            short_id: "abc123de".into(),
            link: "https://github.com/acme/repo/commit/abc123def456".into(),
            message: message.into(),
            ..ForgeCommit::default()
        }
    }

    #[test]
    fn parses_conventional_commit_with_scope() {
        let commit = Commit::parse(&forge_commit("feat(auth): add OAuth2"));

        assert_eq!(commit.group, Group::Feat);
        assert_eq!(commit.scope, Some("auth".into()));
        assert_eq!(commit.description, "add OAuth2");
        assert_eq!(commit.short_id, "abc123de");
        assert!(commit.user_facing);
        assert!(!commit.breaking);
    }

    #[test]
    fn breaking_marker_wins_over_type() {
        let commit = Commit::parse(&forge_commit("chore!: drop node 16"));

        assert_eq!(commit.group, Group::Breaking);
        assert!(commit.breaking);
        assert!(commit.user_facing);
    }

    #[test]
    fn breaking_footer_sets_description() {
        let commit = Commit::parse(&forge_commit(
            "feat: new api\n\nBREAKING CHANGE: the old api is gone",
        ));

        assert_eq!(commit.group, Group::Breaking);
        assert_eq!(
            commit.breaking_description,
            Some("the old api is gone".into())
        );
    }

    #[test]
    fn non_conventional_commit_is_miscellaneous() {
        let commit =
            Commit::parse(&forge_commit("Update readme\n\nMore details\n"));

        assert_eq!(commit.group, Group::Miscellaneous);
        assert_eq!(commit.description, "Update readme");
        assert_eq!(commit.body, Some("More details".into()));
        assert!(!commit.user_facing);
    }

    #[test]
    fn git_revert_subject_is_a_revert() {
        let commit = Commit::parse(&forge_commit(
            "Revert \"feat: add thing\"\n\nThis reverts commit abc.",
        ));

        assert_eq!(commit.group, Group::Revert);
        assert!(commit.user_facing);
    }

    #[test]
    fn chore_is_not_user_facing() {
        let commit = Commit::parse(&forge_commit("chore: tidy"));

        assert_eq!(commit.group, Group::Chore);
        assert!(!commit.user_facing);
    }
}
