//! Live-tag resolution against real repositories.

use std::collections::HashSet;

use imgsweep_cli::config::SweepConfig;
use imgsweep_cli::core::SweepError;
use imgsweep_cli::git::GitRepo;
use imgsweep_cli::live::{live_images, live_tags};
use imgsweep_cli::models::{ImageTag, RootSpec};

use crate::common::{SweepRepo, travis_yml};

fn tags(values: &[&str]) -> HashSet<ImageTag> {
    values.iter().map(|v| ImageTag::from(*v)).collect()
}

fn roots(values: &[&str]) -> Vec<RootSpec> {
    values.iter().map(|v| RootSpec::parse_semi_list(v)).collect()
}

async fn resolve(repo: &SweepRepo, root_args: &[&str]) -> HashSet<ImageTag> {
    live_tags(&GitRepo::new(repo.path()), &roots(root_args), &SweepConfig::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_single_commit_round_trip() {
    let repo = SweepRepo::new().unwrap();
    repo.commit_tag("abc123").unwrap();

    assert_eq!(resolve(&repo, &["HEAD"]).await, tags(&["abc123"]));
}

#[tokio::test]
async fn test_every_revision_in_history_is_live() {
    let repo = SweepRepo::new().unwrap();
    repo.commit_tag("build-1").unwrap();
    repo.commit_tag("build-2").unwrap();
    repo.commit_tag("build-3").unwrap();

    assert_eq!(resolve(&repo, &["HEAD"]).await, tags(&["build-1", "build-2", "build-3"]));
    assert_eq!(resolve(&repo, &["HEAD;-n;1"]).await, tags(&["build-3"]));
}

#[tokio::test]
async fn test_roots_combine_by_union() {
    let repo = SweepRepo::new().unwrap();
    repo.commit_tag("base").unwrap();
    repo.git().create_branch("feature").unwrap();
    repo.commit_tag("feature-only").unwrap();
    repo.git().checkout("main").unwrap();
    assert_eq!(repo.git().get_current_branch().unwrap(), "main");
    repo.commit_tag("main-only").unwrap();

    assert_eq!(resolve(&repo, &["main;-n;1"]).await, tags(&["main-only"]));

    let forward = resolve(&repo, &["main;-n;1", "feature;-n;1"]).await;
    let reversed = resolve(&repo, &["feature;-n;1", "main;-n;1"]).await;
    assert_eq!(forward, tags(&["main-only", "feature-only"]));
    assert_eq!(forward, reversed);
}

#[tokio::test]
async fn test_tag_roots() {
    let repo = SweepRepo::new().unwrap();
    repo.commit_tag("released").unwrap();
    repo.git().tag("v1.0").unwrap();
    repo.commit_tag("unreleased").unwrap();

    assert_eq!(resolve(&repo, &["--tags;-n;1"]).await, tags(&["released"]));
}

#[tokio::test]
async fn test_since_root_limits_history() {
    let repo = SweepRepo::new().unwrap();
    std::fs::write(repo.path().join(".travis.yml"), crate::common::travis_for_tag("ancient"))
        .unwrap();
    repo.git().add_all().unwrap();
    repo.git().commit_at("Old build", "2015-01-01T00:00:00Z").unwrap();
    repo.commit_tag("recent").unwrap();

    assert_eq!(resolve(&repo, &["HEAD;--since=2020-01-01"]).await, tags(&["recent"]));
}

#[tokio::test]
async fn test_commits_without_tracked_file_contribute_nothing() {
    let repo = SweepRepo::new().unwrap();
    repo.git().commit_file("README.md", "readme", "Docs only").unwrap();
    repo.commit_tag("kept").unwrap();
    repo.git().remove_file(".travis.yml", "Drop CI").unwrap();
    repo.git().commit_file("README.md", "more", "More docs").unwrap();

    assert_eq!(resolve(&repo, &["HEAD"]).await, tags(&["kept"]));
    assert!(resolve(&repo, &["HEAD;-n;2"]).await.is_empty());
}

#[tokio::test]
async fn test_foreign_registry_references_are_ignored() {
    let repo = SweepRepo::new().unwrap();
    repo.git()
        .commit_file(".travis.yml", &travis_yml("otherregistry.azurecr.io/ubuntu-1604:x"), "Other")
        .unwrap();
    repo.git()
        .commit_file(".travis.yml", &travis_yml("evilbondciimages.azurecr.io/ubuntu-1604:y"), "Evil")
        .unwrap();
    repo.commit_tag("ours").unwrap();

    let repo_handle = GitRepo::new(repo.path());
    let images =
        live_images(&repo_handle, &roots(&["HEAD"]), ":/.travis.yml", 4).await.unwrap();
    assert_eq!(images.len(), 3);
    assert_eq!(resolve(&repo, &["HEAD"]).await, tags(&["ours"]));
}

#[tokio::test]
async fn test_reverted_content_is_shared() {
    let repo = SweepRepo::new().unwrap();
    let first = repo.commit_tag("same").unwrap();
    repo.commit_tag("other").unwrap();
    let third = repo.commit_tag("same").unwrap();
    assert_ne!(first, third);

    assert_eq!(resolve(&repo, &["HEAD"]).await, tags(&["same", "other"]));
}

#[tokio::test]
async fn test_custom_tracked_path_and_registry() {
    let repo = SweepRepo::new().unwrap();
    repo.git()
        .commit_file("ci/build.yml", &travis_yml("myregistry.azurecr.io/centos:c7"), "CI")
        .unwrap();

    let config = SweepConfig {
        registry_name: "myregistry".to_string(),
        repository_name: "centos".to_string(),
        tracked_path: ":/ci/build.yml".to_string(),
        max_parallel: 1,
    };
    let result =
        live_tags(&GitRepo::new(repo.path()), &roots(&["HEAD"]), &config).await.unwrap();
    assert_eq!(result, tags(&["c7"]));
}

#[tokio::test]
async fn test_sequential_and_parallel_agree() {
    let repo = SweepRepo::new().unwrap();
    for i in 0..12 {
        repo.commit_tag(&format!("build-{}", i % 5)).unwrap();
    }
    let backend = GitRepo::new(repo.path());
    let sequential = SweepConfig {
        max_parallel: 1,
        ..SweepConfig::default()
    };
    let parallel = SweepConfig {
        max_parallel: 8,
        ..SweepConfig::default()
    };

    let a = live_tags(&backend, &roots(&["HEAD"]), &sequential).await.unwrap();
    let b = live_tags(&backend, &roots(&["HEAD"]), &parallel).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 5);
}

#[tokio::test]
async fn test_malformed_reference_under_prefix_is_error() {
    let repo = SweepRepo::new().unwrap();
    repo.git()
        .commit_file(".travis.yml", &travis_yml("bondciimages.azurecr.io/ubuntu-1604"), "No tag")
        .unwrap();

    let err = live_tags(&GitRepo::new(repo.path()), &roots(&["HEAD"]), &SweepConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err.chain().find_map(|e| e.downcast_ref::<SweepError>()),
        Some(SweepError::MalformedImageReference { .. })
    ));
}

#[tokio::test]
async fn test_unknown_revision_is_fatal() {
    let repo = SweepRepo::new().unwrap();
    repo.commit_tag("x").unwrap();

    let err = live_tags(
        &GitRepo::new(repo.path()),
        &roots(&["HEAD", "no-such-branch"]),
        &SweepConfig::default(),
    )
    .await
    .unwrap_err();

    let typed = err.chain().find_map(|e| e.downcast_ref::<SweepError>());
    match typed {
        Some(SweepError::GitCommandError {
            command,
            exit_code,
            stderr,
            ..
        }) => {
            assert!(command.contains("rev-list no-such-branch"));
            assert_ne!(*exit_code, Some(0));
            assert!(!stderr.is_empty());
        }
        other => panic!("expected GitCommandError, got {other:?}"),
    }
}
