//! Encodes and decodes the branch names, pull request titles and tag names
//! that tie a release pull request to the packages and versions it proposes.
use regex::{Captures, Regex};
use semver::Version;
use std::{fmt, sync::LazyLock};

/// Leading token of every branch created by this tool
pub const BRANCH_PREFIX: &str = "monorelease";

/// Shape of a recognized branch name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchShape {
    Release,
    Target,
    TargetComponent,
}

/// Branch grammars in priority order. Parsing stops at the first match, so
/// more specific grammars come first.
static BRANCH_GRAMMARS: LazyLock<Vec<(BranchShape, Regex)>> =
    LazyLock::new(|| {
        vec![
            // the version is anchored on the last `-v` so components may
            // themselves contain `-v<version>`
            (
                BranchShape::Release,
                Regex::new(
                    r"^release-(?:(?<component>\S+)-)?v(?<version>\d+\.\d+\.\d+\S*)$",
                )
                .unwrap(),
            ),
            (
                BranchShape::Target,
                Regex::new(&format!(
                    r"^{BRANCH_PREFIX}--branches--(?<branch>[^-\s]+(?:-[^-\s]+)*)$"
                ))
                .unwrap(),
            ),
            (
                BranchShape::TargetComponent,
                Regex::new(&format!(
                    r"^{BRANCH_PREFIX}--branches--(?<branch>[^-\s]+(?:-[^-\s]+)*)--components--(?<component>\S+)$"
                ))
                .unwrap(),
            ),
        ]
    });

fn capture(caps: &Captures, name: &str) -> Option<String> {
    caps.name(name).map(|m| m.as_str().to_string())
}

/// Identity carried by a release branch name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchName {
    /// `release-v<version>` or `release-<component>-v<version>`
    Release {
        component: Option<String>,
        version: String,
    },
    /// `<prefix>--branches--<branch>`: aggregate pull request
    Target { branch: String },
    /// `<prefix>--branches--<branch>--components--<component>`
    TargetComponent { branch: String, component: String },
}

impl BranchName {
    pub fn aggregate(target_branch: &str) -> Self {
        Self::Target {
            branch: target_branch.to_string(),
        }
    }

    pub fn for_component(target_branch: &str, component: &str) -> Self {
        Self::TargetComponent {
            branch: target_branch.to_string(),
            component: component.to_string(),
        }
    }

    /// Returns `None` when `raw` is not a release branch
    pub fn parse(raw: &str) -> Option<Self> {
        BRANCH_GRAMMARS.iter().find_map(|(shape, regex)| {
            let caps = regex.captures(raw)?;
            match shape {
                BranchShape::Release => Some(Self::Release {
                    component: capture(&caps, "component"),
                    version: capture(&caps, "version")?,
                }),
                BranchShape::Target => Some(Self::Target {
                    branch: capture(&caps, "branch")?,
                }),
                BranchShape::TargetComponent => Some(Self::TargetComponent {
                    branch: capture(&caps, "branch")?,
                    component: capture(&caps, "component")?,
                }),
            }
        })
    }

    pub fn target_branch(&self) -> Option<&str> {
        match self {
            Self::Release { .. } => None,
            Self::Target { branch } | Self::TargetComponent { branch, .. } => {
                Some(branch)
            }
        }
    }

    pub fn component(&self) -> Option<&str> {
        match self {
            Self::Release { component, .. } => component.as_deref(),
            Self::Target { .. } => None,
            Self::TargetComponent { component, .. } => Some(component),
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Release { version, .. } => Some(version),
            _ => None,
        }
    }

    /// Whether a branch produced by this tool belongs to `target_branch`.
    /// Legacy `release-` branches carry no target and match every branch.
    pub fn targets(&self, target_branch: &str) -> bool {
        self.target_branch().is_none_or(|b| b == target_branch)
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Release {
                component: Some(component),
                version,
            } => write!(f, "release-{component}-v{version}"),
            Self::Release {
                component: None,
                version,
            } => write!(f, "release-v{version}"),
            Self::Target { branch } => {
                write!(f, "{BRANCH_PREFIX}--branches--{branch}")
            }
            Self::TargetComponent { branch, component } => write!(
                f,
                "{BRANCH_PREFIX}--branches--{branch}--components--{component}"
            ),
        }
    }
}

static TITLE_COMPONENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^chore\((?<branch>[^()\s]+)\): release (?<component>\S+) (?<version>\d+\.\d+\.\d+\S*)$",
    )
    .unwrap()
});

static TITLE_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^chore\((?<branch>[^()\s]+)\): release (?<version>\d+\.\d+\.\d+\S*)$",
    )
    .unwrap()
});

static TITLE_AGGREGATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^chore\((?<branch>[^()\s]+)\): release (?<target>\S+)$")
        .unwrap()
});

/// Identity carried by a release pull request title
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestTitle {
    /// `chore(<branch>): release <component> <version>`
    Component {
        branch: String,
        component: String,
        version: String,
    },
    /// `chore(<branch>): release <version>`
    Version { branch: String, version: String },
    /// `chore(<branch>): release <branch>`
    Aggregate { branch: String },
}

impl PullRequestTitle {
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(caps) = TITLE_COMPONENT_REGEX.captures(raw) {
            return Some(Self::Component {
                branch: capture(&caps, "branch")?,
                component: capture(&caps, "component")?,
                version: capture(&caps, "version")?,
            });
        }

        if let Some(caps) = TITLE_VERSION_REGEX.captures(raw) {
            return Some(Self::Version {
                branch: capture(&caps, "branch")?,
                version: capture(&caps, "version")?,
            });
        }

        let caps = TITLE_AGGREGATE_REGEX.captures(raw)?;
        let branch = capture(&caps, "branch")?;

        if capture(&caps, "target")? != branch {
            return None;
        }

        Some(Self::Aggregate { branch })
    }

    pub fn component(&self) -> Option<&str> {
        match self {
            Self::Component { component, .. } => Some(component),
            _ => None,
        }
    }
}

impl fmt::Display for PullRequestTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component {
                branch,
                component,
                version,
            } => write!(f, "chore({branch}): release {component} {version}"),
            Self::Version { branch, version } => {
                write!(f, "chore({branch}): release {version}")
            }
            Self::Aggregate { branch } => {
                write!(f, "chore({branch}): release {branch}")
            }
        }
    }
}

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?<component>\S+?)-)?(?<v>v)?(?<version>\d+\.\d+\.\d+\S*)$",
    )
    .unwrap()
});

/// Git tag naming a released package version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagName {
    pub component: Option<String>,
    pub version: Version,
    pub include_v: bool,
}

impl TagName {
    pub fn new(
        component: Option<&str>,
        version: &Version,
        include_v: bool,
    ) -> Self {
        Self {
            component: component.map(|c| c.to_string()),
            version: version.clone(),
            include_v,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let caps = TAG_REGEX.captures(raw)?;
        let version = Version::parse(caps.name("version")?.as_str()).ok()?;

        Some(Self {
            component: capture(&caps, "component"),
            version,
            include_v: caps.name("v").is_some(),
        })
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = if self.include_v { "v" } else { "" };
        match &self.component {
            Some(component) => write!(f, "{component}-{v}{}", self.version),
            None => write!(f, "{v}{}", self.version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_names_round_trip() {
        let raws = [
            "release-v1.2.3",
            "release-my-pkg-v1.2.3-beta.1",
            "release-@scope.pkg-v0.1.0",
            "monorelease--branches--main",
            "monorelease--branches--release/1.x",
            "monorelease--branches--feature-branch",
            "monorelease--branches--main--components--api",
            "monorelease--branches--next-major--components--my-pkg",
        ];

        for raw in raws {
            let parsed = BranchName::parse(raw)
                .unwrap_or_else(|| panic!("failed to parse {raw}"));
            assert_eq!(parsed.to_string(), raw);
        }
    }

    #[test]
    fn encoded_branch_names_round_trip() {
        let names = [
            BranchName::Release {
                component: None,
                version: "2.0.0".into(),
            },
            BranchName::Release {
                component: Some("web".into()),
                version: "2.0.0-rc.1".into(),
            },
            BranchName::aggregate("main"),
            BranchName::for_component("main", "pkg-a"),
        ];

        for name in names {
            assert_eq!(BranchName::parse(&name.to_string()), Some(name));
        }
    }

    #[test]
    fn release_branch_version_follows_last_v() {
        let parsed = BranchName::parse("release-x-v1.2.3-v4.5.6").unwrap();
        assert_eq!(parsed.component(), Some("x-v1.2.3"));
        assert_eq!(parsed.version(), Some("4.5.6"));

        let name = BranchName::Release {
            component: Some("x-v1.2.3".into()),
            version: "4.5.6".into(),
        };
        assert_eq!(BranchName::parse(&name.to_string()), Some(name));
    }

    #[test]
    fn first_grammar_wins() {
        let parsed = BranchName::parse("release-api-v1.0.0").unwrap();
        assert_eq!(parsed.component(), Some("api"));
        assert_eq!(parsed.version(), Some("1.0.0"));
        assert_eq!(parsed.target_branch(), None);

        let parsed = BranchName::parse(
            "monorelease--branches--main--components--api",
        )
        .unwrap();
        assert_eq!(parsed.target_branch(), Some("main"));
        assert_eq!(parsed.component(), Some("api"));
    }

    #[test]
    fn unrelated_branches_are_rejected() {
        for raw in [
            "main",
            "feature/release-notes",
            "release-notes",
            "monorelease--branches--",
            "monorelease--branches--main--other",
            "other--branches--main",
        ] {
            assert_eq!(BranchName::parse(raw), None, "{raw}");
        }
    }

    #[test]
    fn targets_matches_branch() {
        assert!(BranchName::aggregate("main").targets("main"));
        assert!(!BranchName::aggregate("main").targets("next"));
        assert!(BranchName::parse("release-v1.0.0").unwrap().targets("next"));
    }

    #[test]
    fn pull_request_titles_round_trip() {
        for raw in [
            "chore(main): release api 1.2.3",
            "chore(main): release 1.2.3-alpha1",
            "chore(main): release main",
            "chore(release/1.x): release release/1.x",
        ] {
            let parsed = PullRequestTitle::parse(raw)
                .unwrap_or_else(|| panic!("failed to parse {raw}"));
            assert_eq!(parsed.to_string(), raw);
        }
    }

    #[test]
    fn pull_request_title_shapes() {
        assert_eq!(
            PullRequestTitle::parse("chore(main): release api 1.2.3"),
            Some(PullRequestTitle::Component {
                branch: "main".into(),
                component: "api".into(),
                version: "1.2.3".into(),
            })
        );
        assert_eq!(
            PullRequestTitle::parse("chore(main): release 1.2.3"),
            Some(PullRequestTitle::Version {
                branch: "main".into(),
                version: "1.2.3".into(),
            })
        );
        assert_eq!(PullRequestTitle::parse("chore(main): release next"), None);
        assert_eq!(PullRequestTitle::parse("fix: something"), None);
    }

    #[test]
    fn tag_names_encode_component_and_prefix() {
        let version = Version::parse("1.2.3").unwrap();

        assert_eq!(
            TagName::new(Some("api"), &version, true).to_string(),
            "api-v1.2.3"
        );
        assert_eq!(TagName::new(None, &version, true).to_string(), "v1.2.3");
        assert_eq!(
            TagName::new(Some("api"), &version, false).to_string(),
            "api-1.2.3"
        );
    }

    #[test]
    fn tag_names_round_trip() {
        for raw in ["v1.2.3", "my-pkg-v1.0.0-rc.1", "api-2.0.0", "3.0.0"] {
            let parsed = TagName::parse(raw)
                .unwrap_or_else(|| panic!("failed to parse {raw}"));
            assert_eq!(parsed.to_string(), raw);
        }

        let parsed = TagName::parse("my-pkg-v1.0.0").unwrap();
        assert_eq!(parsed.component.as_deref(), Some("my-pkg"));
    }
}
