//! Changelog entries rendered for candidates.

use semver::Version;

use crate::{
    analyzer::{Analyzer, changelog::DEFAULT_TEMPLATE},
    config::package::PackageConfig,
    test_helpers::{TEST_REPO_URL, commit, create_test_package},
};

fn v(raw: &str) -> Version {
    Version::parse(raw).unwrap()
}

#[test]
fn entry_links_compare_between_component_tags() {
    let analyzer = Analyzer::new(DEFAULT_TEMPLATE, TEST_REPO_URL);
    let package = create_test_package("packages/api", "api");

    let candidate = analyzer
        .resolve(&package, Some(&v("1.0.0")), &[commit("c1", "fix: x")])
        .unwrap()
        .unwrap();

    assert!(candidate.changelog_entry.starts_with(&format!(
        "## [1.0.1]({TEST_REPO_URL}/compare/api-v1.0.0...api-v1.0.1)"
    )));
    assert!(candidate.changelog_entry.contains("### Bug Fixes"));
}

#[test]
fn first_release_links_to_release_page() {
    let analyzer = Analyzer::new(DEFAULT_TEMPLATE, TEST_REPO_URL);
    let package = PackageConfig::default();

    let candidate = analyzer
        .resolve(&package, None, &[commit("c1", "feat: x")])
        .unwrap()
        .unwrap();

    assert!(candidate.changelog_entry.starts_with(&format!(
        "## [1.0.0]({TEST_REPO_URL}/releases/tag/v1.0.0)"
    )));
}

#[test]
fn render_reflects_candidate_changes() {
    let analyzer = Analyzer::new("{{ version }}", TEST_REPO_URL);
    let package = create_test_package("packages/api", "api");

    let mut candidate = analyzer
        .resolve(&package, Some(&v("1.0.0")), &[commit("c1", "fix: x")])
        .unwrap()
        .unwrap();
    assert_eq!(candidate.changelog_entry, "1.0.1");

    candidate.next_version = v("1.4.0");
    let rendered = analyzer.render(&package, &candidate).unwrap();

    assert_eq!(rendered, "1.4.0");
}

#[test]
fn invalid_template_fails_resolution() {
    let analyzer = Analyzer::new("{% if %}", TEST_REPO_URL);
    let package = create_test_package("packages/api", "api");

    let result =
        analyzer.resolve(&package, Some(&v("1.0.0")), &[commit("c1", "fix: x")]);

    assert!(result.is_err());
}
