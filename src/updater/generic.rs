use log::*;
use regex::{Captures, Regex};
use semver::Version;
use std::sync::LazyLock;

use crate::Result;

/// Replace the version on this line
pub const INLINE_MARKER: &str = "x-monorelease-version";
/// Replace every version between this marker and [`BLOCK_END_MARKER`]
pub const BLOCK_START_MARKER: &str = "x-monorelease-start-version";
pub const BLOCK_END_MARKER: &str = "x-monorelease-end";

static SEMVER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d+\.\d+\.\d+(?:-[0-9A-Za-z]+(?:\.[0-9A-Za-z-]+)*)?(?:\+[0-9A-Za-z.-]+)?",
    )
    .unwrap()
});

/// Updates versions in arbitrary text files, either through marker comments
/// or a user supplied regex with a `version` capture group.
#[derive(Debug, Clone)]
pub struct GenericUpdater {
    version: Version,
    version_regex: Option<Regex>,
}

impl GenericUpdater {
    pub fn new(version: &Version, version_regex: Option<Regex>) -> Self {
        Self {
            version: version.clone(),
            version_regex,
        }
    }

    pub fn update_content(&self, old: Option<&str>) -> Result<Option<String>> {
        let Some(old) = old else {
            warn!("extra file does not exist: skipping");
            return Ok(None);
        };

        let next = self.version.to_string();

        if let Some(regex) = &self.version_regex {
            return Ok(Some(replace_version_group(regex, old, &next)));
        }

        // a file holding nothing but a version, e.g. VERSION
        if Version::parse(old.trim()).is_ok() {
            return Ok(Some(format!("{next}\n")));
        }

        Ok(Some(replace_marked_lines(old, &next)))
    }
}

fn replace_version_group(regex: &Regex, content: &str, next: &str) -> String {
    regex
        .replace_all(content, |caps: &Captures| {
            let whole = &caps[0];
            match (caps.get(0), caps.name("version")) {
                (Some(found), Some(version)) => {
                    let start = version.start() - found.start();
                    let end = version.end() - found.start();
                    format!("{}{next}{}", &whole[..start], &whole[end..])
                }
                _ => whole.to_string(),
            }
        })
        .into_owned()
}

fn replace_marked_lines(content: &str, next: &str) -> String {
    let mut in_block = false;

    let lines = content
        .split_inclusive('\n')
        .map(|line| {
            if line.contains(BLOCK_START_MARKER) {
                in_block = true;
                return line.to_string();
            }

            if line.contains(BLOCK_END_MARKER) {
                in_block = false;
                return line.to_string();
            }

            if in_block || line.contains(INLINE_MARKER) {
                return SEMVER_REGEX.replace_all(line, next).into_owned();
            }

            line.to_string()
        })
        .collect::<Vec<String>>();

    lines.concat()
}
