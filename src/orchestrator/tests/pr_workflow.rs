//! Tests for the release pull request workflow.
//!
//! Tests for:
//! - create_pull_requests with nothing to release
//! - Aggregate and per-component pull requests
//! - Idempotent open: no-op, update in place, create
//! - Closing superseded release pull requests
//! - Validation before any side effect

use semver::Version;
use std::sync::{Arc, Mutex};

use super::common::*;
use crate::{
    MonoreleaseError,
    config::DEFAULT_MANIFEST_FILE,
    forge::request::{CreatePrRequest, PullRequest},
    manifest::parse_manifest,
    test_helpers::{commit_with_files, create_test_pull_request},
};

const AGGREGATE_BRANCH: &str = "monorelease--branches--main";

fn two_packages() -> &'static str {
    r#"{ "packages": { "pkgA": {}, "pkgB": {} } }"#
}

/// pkgA has a fix, pkgB only a chore
fn example_fixture() -> Fixture {
    let mut fixture =
        Fixture::with_manifest(&[("pkgA", "1.0.0"), ("pkgB", "2.0.0")]);
    fixture.commits = vec![
        commit_with_files(
            "a1b2c3d4e5",
            "fix: handle empty input",
            &["pkgA/x.ts"],
        ),
        commit_with_files(
            "b2c3d4e5f6",
            "chore: tidy scripts",
            &["pkgB/y.py"],
        ),
    ];
    fixture
}

fn opened(req: CreatePrRequest, number: u64) -> PullRequest {
    PullRequest {
        number,
        head_branch: req.head_branch,
        base_branch: req.base_branch,
        title: req.title,
        body: req.body,
        labels: req.labels,
        merge_commit_sha: None,
    }
}

fn file<'a>(req: &'a CreatePrRequest, path: &str) -> Option<&'a str> {
    req.file_changes
        .iter()
        .find(|c| c.path == path)
        .map(|c| c.content.as_str())
}

#[tokio::test]
async fn nothing_user_facing_opens_no_pull_request() {
    let mut fixture =
        Fixture::with_manifest(&[("pkgA", "1.0.0"), ("pkgB", "2.0.0")]);
    fixture.commits = vec![
        commit_with_files("a1b2c3d4e5", "chore: bump deps", &["pkgA/x.ts"]),
        commit_with_files("b2c3d4e5f6", "docs: explain setup", &["pkgB/README.md"]),
    ];

    // no mutation is mocked: any attempt panics
    let orchestrator = create_test_orchestrator(
        fixture.mock(),
        resolve_config(two_packages()),
    );

    let numbers = orchestrator.create_pull_requests().await.unwrap();

    assert!(numbers.is_empty());
}

#[tokio::test]
async fn only_packages_with_releasable_changes_are_proposed() {
    let fixture = example_fixture();
    let captured = Arc::new(Mutex::new(vec![]));

    let mut mock = fixture.mock();
    let requests = Arc::clone(&captured);
    mock.expect_create_pull_request()
        .times(1)
        .returning(move |req| {
            requests.lock().unwrap().push(req.clone());
            Ok(opened(req, 7))
        });

    let orchestrator =
        create_test_orchestrator(mock, resolve_config(two_packages()));

    let numbers = orchestrator.create_pull_requests().await.unwrap();

    assert_eq!(numbers, vec![7]);

    let requests = captured.lock().unwrap();
    let req = &requests[0];

    assert_eq!(req.head_branch, AGGREGATE_BRANCH);
    assert_eq!(req.base_branch, "main");
    assert_eq!(req.title, "chore(main): release main");
    assert_eq!(req.labels, vec![PENDING_LABEL.to_string()]);
    assert!(req.body.contains("<summary>pkgA: 1.0.1</summary>"));
    assert!(!req.body.contains("pkgB"));

    let paths = req
        .file_changes
        .iter()
        .map(|c| c.path.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(paths, vec![DEFAULT_MANIFEST_FILE, "pkgA/CHANGELOG.md"]);

    let manifest = file(req, DEFAULT_MANIFEST_FILE).unwrap();
    assert!(manifest.contains(r#""pkgA": "1.0.1""#));
    assert!(manifest.contains(r#""pkgB": "2.0.0""#));

    let changelog = file(req, "pkgA/CHANGELOG.md").unwrap();
    assert!(changelog.starts_with("# Changelog\n\n## [1.0.1]"));
    assert!(changelog.contains("handle empty input"));
}

#[tokio::test]
async fn unchanged_pull_request_is_left_alone() {
    let mut fixture = example_fixture();

    let body = {
        let orchestrator = create_test_orchestrator(
            fixture.mock(),
            resolve_config(two_packages()),
        );
        let splitter = orchestrator.validate().await.unwrap();
        let plan = orchestrator.release_plan(&splitter).await.unwrap().unwrap();
        let pending = orchestrator
            .pending_pull_requests(plan)
            .await
            .unwrap();
        pending[0].body.clone()
    };

    fixture.open = vec![PullRequest {
        body,
        ..create_test_pull_request(5, AGGREGATE_BRANCH, &[PENDING_LABEL])
    }];

    let orchestrator = create_test_orchestrator(
        fixture.mock(),
        resolve_config(two_packages()),
    );

    let numbers = orchestrator.create_pull_requests().await.unwrap();

    assert_eq!(numbers, vec![5]);
}

#[tokio::test]
async fn changed_pull_request_is_updated_in_place() {
    let mut fixture = example_fixture();
    fixture.open = vec![PullRequest {
        body: "outdated".into(),
        ..create_test_pull_request(5, AGGREGATE_BRANCH, &[PENDING_LABEL])
    }];

    let mut mock = fixture.mock();
    mock.expect_update_pull_request()
        .times(1)
        .withf(|req| {
            req.pr_number == 5
                && req.head_branch == AGGREGATE_BRANCH
                && req.title == "chore(main): release main"
                && req.body.contains("<summary>pkgA: 1.0.1</summary>")
                && req.file_changes.len() == 2
        })
        .returning(|_| Ok(()));

    let orchestrator =
        create_test_orchestrator(mock, resolve_config(two_packages()));

    let numbers = orchestrator.create_pull_requests().await.unwrap();

    assert_eq!(numbers, vec![5]);
}

#[tokio::test]
async fn superseded_release_pull_requests_are_closed() {
    let mut fixture = example_fixture();
    fixture.open = vec![
        create_test_pull_request(3, "release-v0.9.0", &[PENDING_LABEL]),
        create_test_pull_request(4, "feature/search", &[PENDING_LABEL]),
        create_test_pull_request(6, "monorelease--branches--other", &[PENDING_LABEL]),
    ];

    let mut mock = fixture.mock();
    mock.expect_create_pull_request()
        .times(1)
        .returning(|req| Ok(opened(req, 8)));
    mock.expect_comment_on_issue()
        .times(1)
        .withf(|number, body| *number == 3 && body == "Superseded by #8.")
        .returning(|_, _| Ok(()));
    mock.expect_close_pull_request()
        .times(1)
        .withf(|number| *number == 3)
        .returning(|_| Ok(()));

    let orchestrator =
        create_test_orchestrator(mock, resolve_config(two_packages()));

    let numbers = orchestrator.create_pull_requests().await.unwrap();

    assert_eq!(numbers, vec![8]);
}

#[tokio::test]
async fn separate_pull_requests_are_opened_per_component() {
    let mut fixture =
        Fixture::with_manifest(&[("pkgA", "1.0.0"), ("pkgB", "2.0.0")]);
    fixture.commits = vec![
        commit_with_files("a1b2c3d4e5", "fix: handle empty input", &["pkgA/x.ts"]),
        commit_with_files("b2c3d4e5f6", "feat: add search", &["pkgB/y.py"]),
    ];
    // another component: not superseded
    fixture.open = vec![create_test_pull_request(
        2,
        "monorelease--branches--main--components--pkgC",
        &[PENDING_LABEL],
    )];

    let captured = Arc::new(Mutex::new(vec![]));

    let mut mock = fixture.mock();
    let requests = Arc::clone(&captured);
    mock.expect_create_pull_request()
        .times(2)
        .returning(move |req| {
            requests.lock().unwrap().push(req.clone());
            let number = if req.head_branch.ends_with("pkgA") { 11 } else { 12 };
            Ok(opened(req, number))
        });

    let orchestrator = create_test_orchestrator(
        mock,
        resolve_config(
            r#"{ "separate-pull-requests": true, "packages": { "pkgA": {}, "pkgB": {} } }"#,
        ),
    );

    let numbers = orchestrator.create_pull_requests().await.unwrap();

    assert_eq!(numbers, vec![11, 12]);

    let requests = captured.lock().unwrap();

    assert_eq!(
        requests[0].head_branch,
        "monorelease--branches--main--components--pkgA"
    );
    assert_eq!(requests[0].title, "chore(main): release pkgA 1.0.1");
    assert_eq!(
        requests[1].head_branch,
        "monorelease--branches--main--components--pkgB"
    );
    assert_eq!(requests[1].title, "chore(main): release pkgB 2.1.0");

    // each pull request only moves its own manifest entry
    let manifest = file(&requests[0], DEFAULT_MANIFEST_FILE).unwrap();
    assert!(manifest.contains(r#""pkgA": "1.0.1""#));
    assert!(manifest.contains(r#""pkgB": "2.0.0""#));
}

#[tokio::test]
async fn single_root_package_uses_version_title_and_bare_tags() {
    let mut fixture = Fixture::with_manifest(&[(".", "1.2.3")]);
    fixture.files.insert(
        "CHANGELOG.md".into(),
        "# Changelog\n\n## [1.2.3](link) (2024-01-01)\n".into(),
    );
    fixture.commits = vec![commit_with_files(
        "c3d4e5f6a7",
        "feat: add search",
        &["src/search.rs"],
    )];

    let captured = Arc::new(Mutex::new(vec![]));

    let mut mock = fixture.mock();
    let requests = Arc::clone(&captured);
    mock.expect_create_pull_request()
        .times(1)
        .returning(move |req| {
            requests.lock().unwrap().push(req.clone());
            Ok(opened(req, 1))
        });

    let orchestrator =
        create_test_orchestrator(mock, resolve_config(r#"{ "packages": { ".": {} } }"#));

    orchestrator.create_pull_requests().await.unwrap();

    let requests = captured.lock().unwrap();
    let req = &requests[0];

    assert_eq!(req.head_branch, AGGREGATE_BRANCH);
    assert_eq!(req.title, "chore(main): release 1.3.0");

    let changelog = file(req, "CHANGELOG.md").unwrap();
    assert!(changelog.starts_with("# Changelog\n\n## [1.3.0]"));
    assert!(changelog.contains("compare/v1.2.3...v1.3.0"));
    assert!(changelog.contains("## [1.2.3](link)"));
}

#[tokio::test]
async fn linked_versions_plugin_adds_unchanged_members() {
    let mut fixture =
        Fixture::with_manifest(&[("pkgA", "1.0.0"), ("pkgB", "1.0.0")]);
    fixture.commits = vec![commit_with_files(
        "a1b2c3d4e5",
        "fix: handle empty input",
        &["pkgA/x.ts"],
    )];

    let captured = Arc::new(Mutex::new(vec![]));

    let mut mock = fixture.mock();
    let requests = Arc::clone(&captured);
    mock.expect_create_pull_request()
        .times(1)
        .returning(move |req| {
            requests.lock().unwrap().push(req.clone());
            Ok(opened(req, 1))
        });

    let orchestrator = create_test_orchestrator(
        mock,
        resolve_config(
            r#"{
                "packages": { "pkgA": {}, "pkgB": {} },
                "plugins": [
                    { "type": "linked-versions", "groupName": "core", "components": ["pkgA", "pkgB"] }
                ]
            }"#,
        ),
    );

    orchestrator.create_pull_requests().await.unwrap();

    let requests = captured.lock().unwrap();
    let req = &requests[0];

    assert!(req.body.contains("<summary>pkgA: 1.0.1</summary>"));
    assert!(req.body.contains("<summary>pkgB: 1.0.1</summary>"));

    let manifest = file(req, DEFAULT_MANIFEST_FILE).unwrap();
    assert!(manifest.contains(r#""pkgB": "1.0.1""#));
}

#[tokio::test]
async fn plan_overlays_released_versions_on_prior_versions() {
    let fixture = example_fixture();
    let orchestrator = create_test_orchestrator(
        fixture.mock(),
        resolve_config(two_packages()),
    );

    let splitter = orchestrator.validate().await.unwrap();
    let plan = orchestrator.release_plan(&splitter).await.unwrap().unwrap();

    assert_eq!(plan.versions["pkgA"], Version::new(1, 0, 1));
    assert_eq!(plan.versions["pkgB"], Version::new(2, 0, 0));
    assert_eq!(plan.released().len(), 1);
    assert_eq!(plan.released()["pkgA"], Version::new(1, 0, 1));
}

#[tokio::test]
async fn manifest_change_follows_plan_versions() {
    let fixture = example_fixture();
    let orchestrator = create_test_orchestrator(
        fixture.mock(),
        resolve_config(two_packages()),
    );

    let splitter = orchestrator.validate().await.unwrap();
    let mut plan =
        orchestrator.release_plan(&splitter).await.unwrap().unwrap();
    // a rewrite of the versions map alone reaches the manifest
    plan.versions.insert("pkgB".into(), Version::new(2, 1, 0));

    let pending = orchestrator.pending_pull_requests(plan).await.unwrap();

    let manifest = &pending[0].changeset[0];
    assert_eq!(manifest.path, DEFAULT_MANIFEST_FILE);

    let versions = parse_manifest(&manifest.content).unwrap();
    assert_eq!(versions["pkgA"], Version::new(1, 0, 1));
    assert_eq!(versions["pkgB"], Version::new(2, 1, 0));
}

#[tokio::test]
async fn invalid_manifest_aborts_before_side_effects() {
    let mut fixture = example_fixture();
    fixture
        .files
        .insert(DEFAULT_MANIFEST_FILE.into(), r#"{ "pkgA": 1 }"#.into());

    let orchestrator = create_test_orchestrator(
        fixture.mock(),
        resolve_config(two_packages()),
    );

    let result = orchestrator.create_pull_requests().await;

    assert!(matches!(result, Err(MonoreleaseError::InvalidConfig(_))));
}

#[tokio::test]
async fn overlapping_package_paths_abort_before_side_effects() {
    let fixture = example_fixture();

    let orchestrator = create_test_orchestrator(
        fixture.mock(),
        resolve_config(r#"{ "packages": { "pkgA": {}, "pkgA/sub/": {} } }"#),
    );

    let result = orchestrator.create_pull_requests().await;

    assert!(matches!(result, Err(MonoreleaseError::InvalidConfig(_))));
}
