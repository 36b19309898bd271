//! Release pull request body: one collapsible section per package.
//!
//! The body is the only place the release notes of a merged pull request
//! survive until the release step, so sections must be parseable.
use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

use crate::analyzer::ReleaseCandidate;

const BODY_HEADER: &str = ":robot: I have created a release *beep* *boop*";
const BODY_FOOTER: &str = "This PR was generated with monorelease.";

static SECTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<details><summary>(?<summary>[^<]*)</summary>\n\n(?<notes>.*?)\n</details>",
    )
    .unwrap()
});

fn summary(component: &str, version: &Version) -> String {
    format!("{component}: {version}")
}

/// Renders the body for the given candidates, in order
pub fn render_body(candidates: &[ReleaseCandidate]) -> String {
    let sections = candidates
        .iter()
        .map(|c| {
            format!(
                "<details><summary>{}</summary>\n\n{}\n</details>",
                summary(&c.component, &c.next_version),
                c.changelog_entry.trim()
            )
        })
        .collect::<Vec<String>>()
        .join("\n\n");

    format!("{BODY_HEADER}\n---\n\n{sections}\n\n---\n{BODY_FOOTER}\n")
}

/// Notes for `component` at `version` from a release pull request body,
/// without the entry heading
pub fn release_notes(
    body: &str,
    component: &str,
    version: &Version,
) -> Option<String> {
    let wanted = summary(component, version);

    SECTION_REGEX
        .captures_iter(body)
        .find(|caps| caps["summary"].trim() == wanted)
        .map(|caps| strip_heading(&caps["notes"]))
}

fn strip_heading(entry: &str) -> String {
    let entry = entry.trim();

    match entry.split_once('\n') {
        Some((first, rest)) if first.starts_with("## ") => {
            rest.trim().to_string()
        }
        None if entry.starts_with("## ") => "".into(),
        _ => entry.to_string(),
    }
}
