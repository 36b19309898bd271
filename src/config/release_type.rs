use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Supported release types. Each type owns the manifest files rewritten
/// for a release; `Generic` only touches the changelog and `extra-files`.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseType {
    #[default]
    #[serde(alias = "simple")]
    Generic,
    Node,
    Rust,
    Python,
}

impl Display for ReleaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseType::Generic => f.write_str("generic"),
            ReleaseType::Node => f.write_str("node"),
            ReleaseType::Python => f.write_str("python"),
            ReleaseType::Rust => f.write_str("rust"),
        }
    }
}
