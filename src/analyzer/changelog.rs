//! Changelog entry rendering using Tera templates.
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::{Result, analyzer::commit::Commit};

/// Default changelog entry template.
///
/// Available context: `version`, `previous_version`, `component`, `link`,
/// `date` and `commits` (pre-sorted by group).
pub const DEFAULT_TEMPLATE: &str = r#"## [{{ version }}]({{ link }}) ({{ date }})
{% for group, commits in commits | filter(attribute="user_facing", value=true) | group_by(attribute="group") %}
### {{ group | striptags | trim }}

{% for commit in commits -%}
* {% if commit.scope %}**{{ commit.scope }}:** {% endif %}{% if commit.breaking_description %}{{ commit.breaking_description }}{% else %}{{ commit.description }}{% endif %} ([{{ commit.short_id }}]({{ commit.link }}))
{% endfor %}
{% endfor %}
"#;

static EXTRA_NEW_LINES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Values exposed to the changelog template
#[derive(Debug, Clone, Serialize)]
pub struct EntryContext<'a> {
    pub version: String,
    pub previous_version: Option<String>,
    pub component: &'a str,
    pub link: String,
    pub date: String,
    pub commits: Vec<&'a Commit>,
}

impl<'a> EntryContext<'a> {
    /// Commits are stably sorted by group so sections render in a fixed
    /// order regardless of how the template groups them.
    pub fn new(
        version: String,
        previous_version: Option<String>,
        component: &'a str,
        link: String,
        commits: &'a [Commit],
    ) -> Self {
        let mut sorted = commits.iter().collect::<Vec<&Commit>>();
        sorted.sort_by_key(|c| c.group);

        Self {
            version,
            previous_version,
            component,
            link,
            date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
            commits: sorted,
        }
    }
}

/// Renders a single changelog entry
pub fn render_entry(template: &str, context: &EntryContext) -> Result<String> {
    let context = tera::Context::from_serialize(context)?;
    let rendered = tera::Tera::one_off(template, &context, false)?;
    Ok(strip_extra_lines(&rendered))
}

/// Compare link between two tags, or the release page of the first release
pub fn release_link(
    repo_url: &str,
    previous_tag: Option<&str>,
    next_tag: &str,
) -> String {
    let repo_url = repo_url.trim_end_matches('/');
    match previous_tag {
        Some(previous) => format!("{repo_url}/compare/{previous}...{next_tag}"),
        None => format!("{repo_url}/releases/tag/{next_tag}"),
    }
}

/// Normalize changelog formatting by collapsing 3+ newlines and trimming.
pub fn strip_extra_lines(changelog: &str) -> String {
    EXTRA_NEW_LINES_REGEX
        .replace_all(changelog, "\n\n")
        .trim()
        .to_string()
}

/// Inserts `entry` into an existing changelog, below a leading `# ` title if
/// there is one. A missing changelog gets a default title.
pub fn prepend_entry(existing: Option<&str>, entry: &str) -> String {
    let existing = existing.map(str::trim).unwrap_or_default();

    if existing.is_empty() {
        return format!("# Changelog\n\n{entry}\n");
    }

    if let Some(rest) = existing.strip_prefix("# ") {
        let (title, body) = rest.split_once('\n').unwrap_or((rest, ""));
        let body = body.trim_start();
        if body.is_empty() {
            return format!("# {title}\n\n{entry}\n");
        }
        return format!("# {title}\n\n{entry}\n\n{body}\n");
    }

    format!("{entry}\n\n{existing}\n")
}
