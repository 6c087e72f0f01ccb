//! End-to-end release flows against the in-memory hosting backend

use std::sync::Arc;

use liftoff_core::config::{DEFAULT_CONFIG_FILE, DEFAULT_MANIFEST_FILE};
use liftoff_core::Version;
use liftoff_git::{Commit, HostedRelease, MemoryHosting, PullRequest, RepositoryInfo};
use liftoff_release::{Manifest, OpenedReleasePullRequest};

fn repository() -> RepositoryInfo {
    RepositoryInfo::new("owner", "repo", "main")
}

fn release(tag: &str, sha: &str) -> HostedRelease {
    HostedRelease {
        name: Some(tag.to_string()),
        tag_name: tag.to_string(),
        sha: sha.to_string(),
        notes: None,
        url: None,
    }
}

fn package_json(name: &str, version: &str, dependencies: &[(&str, &str)]) -> String {
    let deps = dependencies
        .iter()
        .map(|(name, req)| format!("\"{}\": \"{}\"", name, req))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{{\n  \"name\": \"{}\",\n  \"version\": \"{}\",\n  \"dependencies\": {{{}}}\n}}\n",
        name, version, deps
    )
}

fn change<'a>(opened: &'a OpenedReleasePullRequest, path: &str) -> &'a str {
    opened
        .request
        .changes
        .iter()
        .find(|c| c.path == path)
        .map(|c| c.content.as_str())
        .unwrap_or_else(|| panic!("no change to {}", path))
}

/// Merge an opened release pull request the way the hosting platform would
fn merged(opened: &OpenedReleasePullRequest, number: u64, sha: &str) -> PullRequest {
    PullRequest::new(
        number,
        opened.request.title.clone(),
        opened.request.body.clone(),
        opened.request.head_branch.clone(),
        "main",
    )
    .with_merge_commit(sha)
    .with_labels(opened.request.labels.clone())
}

fn monorepo() -> MemoryHosting {
    MemoryHosting::new(repository())
        .with_file(
            "main",
            DEFAULT_CONFIG_FILE,
            r#"{
                "release-type": "node",
                "packages": {"packages/node1": {}, "packages/node4": {}}
            }"#,
        )
        .with_file(
            "main",
            DEFAULT_MANIFEST_FILE,
            "{\n  \"packages/node1\": \"3.3.3\",\n  \"packages/node4\": \"4.4.4\"\n}\n",
        )
        .with_file("main", "packages/node1/package.json", package_json("node1", "3.3.3", &[]))
        .with_file("main", "packages/node4/package.json", package_json("node4", "4.4.4", &[]))
        .with_releases(vec![release("node4-v4.4.4", "r2"), release("node1-v3.3.3", "r1")])
        .with_commits(
            "main",
            vec![
                Commit::new("c2", "fix: node4 fix").with_files(["packages/node4/index.js"]),
                Commit::new("c1", "fix(node1): node1 fix").with_files(["packages/node1/index.js"]),
                Commit::new("r2", "chore: release node4").with_files(["packages/node4/package.json"]),
                Commit::new("r1", "chore: release node1").with_files(["packages/node1/package.json"]),
            ],
        )
}

#[tokio::test]
async fn test_single_package_patch_release() {
    let hosting = Arc::new(
        MemoryHosting::new(repository())
            .with_file("main", DEFAULT_CONFIG_FILE, r#"{"release-type": "node"}"#)
            .with_file("main", DEFAULT_MANIFEST_FILE, "{\n  \".\": \"0.123.4\"\n}\n")
            .with_file(
                "main",
                "package.json",
                package_json("some-node-package", "0.123.4", &[]),
            )
            .with_releases(vec![release("some-node-package-v0.123.4", "r1")])
            .with_commits(
                "main",
                vec![
                    Commit::new("c1", "fix: bugfix"),
                    Commit::new("r1", "chore(main): release some-node-package 0.123.4"),
                ],
            ),
    );

    let manifest = Manifest::from_hosting(hosting.clone(), None).await.unwrap();
    let opened = manifest.create_pull_requests().await.unwrap();

    assert_eq!(opened.len(), 1);
    let pr = &opened[0];
    assert_eq!(pr.number, Some(1));
    assert_eq!(pr.request.title, "chore(main): release some-node-package 0.123.5");
    assert_eq!(
        pr.request.head_branch,
        "liftoff--branches--main--components--some-node-package"
    );
    assert_eq!(pr.request.labels, vec!["autorelease: pending"]);
    assert_eq!(pr.versions.get("."), Some(&Version::new(0, 123, 5)));

    assert!(pr.request.body.contains("### Bug Fixes"));
    assert!(pr.request.body.contains("bugfix"));
    assert!(change(pr, "package.json").contains("\"version\": \"0.123.5\""));
    assert!(change(pr, "CHANGELOG.md").contains("### Bug Fixes"));
    assert!(change(pr, DEFAULT_MANIFEST_FILE).contains("\".\": \"0.123.5\""));
    // lock files that do not exist are left alone
    assert!(!pr.request.changes.iter().any(|c| c.path == "package-lock.json"));

    let recorded = hosting.opened_pull_requests();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].target_branch, "main");
}

#[tokio::test]
async fn test_nothing_to_release() {
    let hosting = Arc::new(
        MemoryHosting::new(repository())
            .with_file("main", DEFAULT_CONFIG_FILE, r#"{"release-type": "simple"}"#)
            .with_releases(vec![release("repo-v1.0.0", "r1")])
            .with_commits(
                "main",
                vec![
                    Commit::new("c1", "chore: tidy up"),
                    Commit::new("r1", "chore: release 1.0.0"),
                ],
            ),
    );

    let manifest = Manifest::from_hosting(hosting.clone(), Some("main")).await.unwrap();
    assert!(manifest.create_pull_requests().await.unwrap().is_empty());
    assert!(manifest.next_versions().await.unwrap().is_empty());
    assert!(hosting.opened_pull_requests().is_empty());
}

#[tokio::test]
async fn test_monorepo_merged_pull_request() {
    let hosting = Arc::new(monorepo());
    let manifest = Manifest::from_hosting(hosting.clone(), None).await.unwrap();
    let opened = manifest.create_pull_requests().await.unwrap();

    assert_eq!(opened.len(), 1);
    let pr = &opened[0];
    assert_eq!(pr.request.title, "chore: release main");
    assert_eq!(pr.request.head_branch, "liftoff--branches--main");
    assert!(pr.request.body.contains("<details><summary>node1: 3.3.4</summary>"));
    assert!(pr.request.body.contains("<details><summary>node4: 4.4.5</summary>"));

    assert!(change(pr, "packages/node1/package.json").contains("\"version\": \"3.3.4\""));
    assert!(change(pr, "packages/node4/package.json").contains("\"version\": \"4.4.5\""));
    let released = change(pr, DEFAULT_MANIFEST_FILE);
    assert!(released.contains("\"packages/node1\": \"3.3.4\""));
    assert!(released.contains("\"packages/node4\": \"4.4.5\""));
}

#[tokio::test]
async fn test_separate_pull_requests() {
    let hosting = Arc::new(monorepo().with_file(
        "main",
        DEFAULT_CONFIG_FILE,
        r#"{
            "release-type": "node",
            "separate-pull-requests": true,
            "packages": {"packages/node1": {}, "packages/node4": {}}
        }"#,
    ));
    let manifest = Manifest::from_hosting(hosting, None).await.unwrap().with_dry_run(true);
    let opened = manifest.create_pull_requests().await.unwrap();

    let titles: Vec<&str> = opened.iter().map(|o| o.request.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["chore(main): release node1 3.3.4", "chore(main): release node4 4.4.5"]
    );
    assert!(opened.iter().all(|o| o.number.is_none()));
}

#[tokio::test]
async fn test_release_after_merge() {
    let hosting = monorepo();
    let opened = {
        let hosting = Arc::new(monorepo());
        let manifest = Manifest::from_hosting(hosting, None).await.unwrap();
        manifest.create_pull_requests().await.unwrap()
    };
    let hosting = Arc::new(
        hosting.with_merged_pull_requests("main", vec![merged(&opened[0], 7, "m1")]),
    );

    let manifest = Manifest::from_hosting(hosting.clone(), None).await.unwrap();
    let created = manifest.create_releases().await.unwrap();

    let tags: Vec<&str> = created.iter().map(|r| r.tag.as_str()).collect();
    assert_eq!(tags, vec!["node1-v3.3.4", "node4-v4.4.5"]);
    assert!(created.iter().all(|r| r.sha == "m1" && r.pull_request_number == 7));
    assert!(created.iter().all(|r| !r.already_existed));

    let hosted = hosting.created_releases();
    assert_eq!(hosted.len(), 2);
    assert_eq!(hosted[0].name.as_deref(), Some("node1: node1-v3.3.4"));
    assert!(hosted[0].notes.as_deref().unwrap_or_default().contains("### Bug Fixes"));

    // running again finds the tags in place
    let again = manifest.create_releases().await.unwrap();
    assert_eq!(again.len(), 2);
    assert!(again.iter().all(|r| r.already_existed));
    assert_eq!(hosting.created_releases().len(), 2);
}

#[tokio::test]
async fn test_tagged_pull_requests_are_ignored() {
    let body = "header\n---\n\n## 1.0.1 (2024-01-02)\n\n### Bug Fixes\n\n* bug\n\n---\nfooter";
    let tagged = PullRequest::new(
        3,
        "chore(main): release repo 1.0.1",
        body,
        "liftoff--branches--main--components--repo",
        "main",
    )
    .with_merge_commit("m1")
    .with_labels(["autorelease: tagged"]);
    let hosting = Arc::new(
        MemoryHosting::new(repository())
            .with_file("main", DEFAULT_CONFIG_FILE, r#"{"release-type": "simple"}"#)
            .with_merged_pull_requests("main", vec![tagged]),
    );

    let manifest = Manifest::from_hosting(hosting.clone(), None).await.unwrap();
    assert!(manifest.build_releases().await.unwrap().is_empty());
    assert!(hosting.created_releases().is_empty());
}

#[tokio::test]
async fn test_node_workspace_propagates_dependents() {
    let hosting = Arc::new(
        MemoryHosting::new(repository())
            .with_file(
                "main",
                DEFAULT_CONFIG_FILE,
                r#"{
                    "release-type": "node",
                    "plugins": ["node-workspace"],
                    "packages": {"packages/a": {}, "packages/b": {}, "packages/c": {}}
                }"#,
            )
            .with_file(
                "main",
                DEFAULT_MANIFEST_FILE,
                r#"{"packages/a": "1.0.0", "packages/b": "1.0.0", "packages/c": "1.0.0"}"#,
            )
            .with_file("main", "packages/a/package.json", package_json("pkgA", "1.0.0", &[]))
            .with_file(
                "main",
                "packages/b/package.json",
                package_json("pkgB", "1.0.0", &[("pkgA", "^1.0.0")]),
            )
            .with_file(
                "main",
                "packages/c/package.json",
                package_json("pkgC", "1.0.0", &[("pkgB", "^1.0.0"), ("left-pad", "^1.3.0")]),
            )
            .with_releases(vec![
                release("pkgC-v1.0.0", "r1"),
                release("pkgB-v1.0.0", "r1"),
                release("pkgA-v1.0.0", "r1"),
            ])
            .with_commits(
                "main",
                vec![
                    Commit::new("c1", "fix: handle empty input").with_files(["packages/a/index.js"]),
                    Commit::new("r1", "chore: release main").with_files(["packages/a/package.json"]),
                ],
            ),
    );

    let manifest = Manifest::from_hosting(hosting, None).await.unwrap();
    let versions = manifest.next_versions().await.unwrap();
    let patch = Version::new(1, 0, 1);
    assert_eq!(versions.get("packages/a"), Some(&patch));
    assert_eq!(versions.get("packages/b"), Some(&patch));
    assert_eq!(versions.get("packages/c"), Some(&patch));

    let opened = manifest.with_dry_run(true).create_pull_requests().await.unwrap();
    assert_eq!(opened.len(), 1);
    let pr = &opened[0];
    assert_eq!(pr.request.title, "chore: release main");
    assert!(pr.request.body.contains("<details><summary>pkgA: 1.0.1</summary>"));
    assert!(pr.request.body.contains("<details><summary>pkgB: 1.0.1</summary>"));
    assert!(pr.request.body.contains("<details><summary>pkgC: 1.0.1</summary>"));
    assert!(pr.request.body.contains("pkgA bumped from ^1.0.0 to ^1.0.1"));

    let b = change(pr, "packages/b/package.json");
    assert!(b.contains("\"version\": \"1.0.1\""));
    assert!(b.contains("\"pkgA\": \"^1.0.1\""));
    let c = change(pr, "packages/c/package.json");
    assert!(c.contains("\"pkgB\": \"^1.0.1\""));
    assert!(c.contains("\"left-pad\": \"^1.3.0\""));
    assert!(change(pr, "packages/c/CHANGELOG.md").contains("### Dependencies"));
}
