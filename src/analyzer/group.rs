use serde::Serialize;

/// Commit categories based on conventional commit types, used for grouping
/// changes in the changelog. Declaration order is the rendering order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Group {
    Breaking,
    Feat,
    Fix,
    Perf,
    Revert,
    Refactor,
    Doc,
    Style,
    Test,
    Build,
    Chore,
    Ci,
    #[default]
    Miscellaneous,
}

impl Group {
    /// Maps a conventional commit type to its group. Unknown types land in
    /// [`Group::Miscellaneous`].
    pub fn from_type(kind: &str) -> Self {
        match kind.to_ascii_lowercase().as_str() {
            "feat" | "feature" => Group::Feat,
            "fix" => Group::Fix,
            "perf" => Group::Perf,
            "revert" => Group::Revert,
            "refactor" => Group::Refactor,
            "docs" | "doc" => Group::Doc,
            "style" => Group::Style,
            "test" | "tests" => Group::Test,
            "build" | "deps" => Group::Build,
            "chore" => Group::Chore,
            "ci" => Group::Ci,
            _ => Group::Miscellaneous,
        }
    }

    /// Sections that justify a release on their own
    pub fn user_facing(&self) -> bool {
        matches!(
            self,
            Group::Breaking
                | Group::Feat
                | Group::Fix
                | Group::Perf
                | Group::Revert
        )
    }

    pub fn title(&self) -> &'static str {
        match self {
            Group::Breaking => "⚠ BREAKING CHANGES",
            Group::Feat => "Features",
            Group::Fix => "Bug Fixes",
            Group::Perf => "Performance Improvements",
            Group::Revert => "Reverts",
            Group::Refactor => "Code Refactoring",
            Group::Doc => "Documentation",
            Group::Style => "Styles",
            Group::Test => "Tests",
            Group::Build => "Build System",
            Group::Chore => "Miscellaneous Chores",
            Group::Ci => "Continuous Integration",
            Group::Miscellaneous => "Other Changes",
        }
    }
}

// Serialized with a sortable html comment prefix. Templates strip it with
// `striptags`.
impl Serialize for Group {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let index = *self as u32;
        let value = format!("<!-- {index:02} -->{}", self.title());
        serializer.serialize_str(&value)
    }
}
