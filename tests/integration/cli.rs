//! End-to-end runs of the `imgsweep` binary.

use predicates::prelude::*;

use crate::common::{ManifestEntry, SweepRepo, manifest_json, travis_yml};

fn standard_listing(repo: &SweepRepo) -> std::path::PathBuf {
    let json = manifest_json(&[
        ManifestEntry {
            digest: "sha256:live",
            tags: &["build-2"],
            days_old: 90,
        },
        ManifestEntry {
            digest: "sha256:stale",
            tags: &["build-0"],
            days_old: 90,
        },
        ManifestEntry {
            digest: "sha256:young",
            tags: &["build-9"],
            days_old: 1,
        },
        ManifestEntry {
            digest: "sha256:untagged",
            tags: &[],
            days_old: 30,
        },
    ]);
    repo.write_scratch("manifests.json", &json).unwrap()
}

#[test]
fn test_dry_run_lists_garbage() {
    let repo = SweepRepo::new().unwrap();
    repo.commit_tag("build-1").unwrap();
    repo.commit_tag("build-2").unwrap();
    let manifests = standard_listing(&repo);

    repo.command()
        .arg("--repo-path")
        .arg(repo.path())
        .args(["--min-age", "7", "--dry-run", "--manifests"])
        .arg(&manifests)
        .arg("HEAD")
        .assert()
        .success()
        .stdout(predicate::str::contains("Would delete sha256:stale"))
        .stdout(predicate::str::contains("Would delete sha256:untagged"))
        .stdout(predicate::str::contains("sha256:live").not())
        .stdout(predicate::str::contains("sha256:young").not());
}

#[test]
fn test_min_age_zero_still_protects_live_tags() {
    let repo = SweepRepo::new().unwrap();
    repo.commit_tag("build-2").unwrap();
    let manifests = standard_listing(&repo);

    repo.command()
        .arg("-p")
        .arg(repo.path())
        .args(["-m", "0", "--dry-run", "--manifests"])
        .arg(&manifests)
        .arg("HEAD")
        .assert()
        .success()
        .stdout(predicate::str::contains("sha256:young"))
        .stdout(predicate::str::contains("sha256:live").not());
}

#[test]
fn test_nothing_to_delete() {
    let repo = SweepRepo::new().unwrap();
    repo.commit_tag("build-1").unwrap();
    let manifests = repo
        .write_scratch(
            "manifests.json",
            &manifest_json(&[ManifestEntry {
                digest: "sha256:a",
                tags: &["build-1"],
                days_old: 100,
            }]),
        )
        .unwrap();

    repo.command()
        .arg("-p")
        .arg(repo.path())
        .args(["-m", "7", "--dry-run", "--manifests"])
        .arg(&manifests)
        .arg("HEAD")
        .assert()
        .success()
        .stdout(predicate::str::contains("No garbage manifests found"));
}

#[test]
fn test_empty_live_set_aborts() {
    let repo = SweepRepo::new().unwrap();
    repo.git()
        .commit_file(".travis.yml", &travis_yml("docker.io/library/ubuntu:16.04"), "Public image")
        .unwrap();
    let manifests = standard_listing(&repo);

    repo.command()
        .arg("-p")
        .arg(repo.path())
        .args(["-m", "7", "--dry-run", "--manifests"])
        .arg(&manifests)
        .arg("HEAD")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No active tags. This can delete all images, so aborting."))
        .stdout(predicate::str::contains("sha256").not());
}

#[test]
fn test_bad_root_filter_shows_git_output() {
    let repo = SweepRepo::new().unwrap();
    repo.commit_tag("build-1").unwrap();

    repo.command()
        .arg("-p")
        .arg(repo.path())
        .args(["-m", "7", "--dry-run", "HEAD", "no-such-branch;-n;1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("rev-list no-such-branch -n 1"))
        .stderr(predicate::str::contains("STDOUT:"))
        .stderr(predicate::str::contains("STDERR:"))
        .stderr(predicate::str::contains("fatal"));
}

#[test]
fn test_negative_min_age_rejected() {
    let repo = SweepRepo::new().unwrap();
    repo.commit_tag("build-1").unwrap();

    repo.command()
        .arg("-p")
        .arg(repo.path())
        .args(["-m", "-3", "HEAD"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--min-age must be non-negative, but got -3"));
}

#[test]
fn test_huge_min_age_rejected_without_panic() {
    let repo = SweepRepo::new().unwrap();
    repo.commit_tag("build-1").unwrap();

    repo.command()
        .arg("-p")
        .arg(repo.path())
        .args(["-m", "200000000000000", "HEAD"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--min-age 200000000000000 days is out of range"));
}

#[test]
fn test_not_a_repository() {
    let repo = SweepRepo::new().unwrap();
    let plain = repo.scratch_path("plain");
    std::fs::create_dir_all(&plain).unwrap();

    repo.command()
        .arg("-p")
        .arg(&plain)
        .args(["-m", "7", "HEAD"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Not a valid git repository"));
}

#[test]
fn test_missing_root_filter_is_usage_error() {
    let repo = SweepRepo::new().unwrap();

    repo.command()
        .arg("-p")
        .arg(repo.path())
        .args(["-m", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ROOT_FILTERS"));
}

#[test]
fn test_config_file_selects_registry() {
    let repo = SweepRepo::new().unwrap();
    repo.git()
        .commit_file(".travis.yml", &travis_yml("myregistry.azurecr.io/centos:c7"), "CentOS")
        .unwrap();
    let config = repo
        .write_scratch("imgsweep.toml", "registry_name = \"myregistry\"\nrepository_name = \"centos\"\n")
        .unwrap();
    let manifests = repo
        .write_scratch(
            "manifests.json",
            &manifest_json(&[
                ManifestEntry {
                    digest: "sha256:c7",
                    tags: &["c7"],
                    days_old: 50,
                },
                ManifestEntry {
                    digest: "sha256:c6",
                    tags: &["c6"],
                    days_old: 50,
                },
            ]),
        )
        .unwrap();

    repo.command()
        .arg("-p")
        .arg(repo.path())
        .arg("--config")
        .arg(&config)
        .args(["-m", "7", "--dry-run", "--manifests"])
        .arg(&manifests)
        .arg("HEAD")
        .assert()
        .success()
        .stdout(predicate::str::contains("sha256:c6"))
        .stdout(predicate::str::contains("sha256:c7").not());
}

#[test]
fn test_registry_flag_overrides_default() {
    let repo = SweepRepo::new().unwrap();
    repo.git()
        .commit_file(".travis.yml", &travis_yml("otherregistry.azurecr.io/ubuntu-1604:t1"), "Other")
        .unwrap();
    let manifests = standard_listing(&repo);

    // Under the default registry nothing is live
    repo.command()
        .arg("-p")
        .arg(repo.path())
        .args(["-m", "7", "--dry-run", "--manifests"])
        .arg(&manifests)
        .arg("HEAD")
        .assert()
        .code(1);

    repo.command()
        .arg("-p")
        .arg(repo.path())
        .args(["-m", "7", "--dry-run", "--registry", "otherregistry", "--manifests"])
        .arg(&manifests)
        .arg("HEAD")
        .assert()
        .success();
}

#[test]
fn test_missing_manifest_file_fails() {
    let repo = SweepRepo::new().unwrap();
    repo.commit_tag("build-1").unwrap();

    repo.command()
        .arg("-p")
        .arg(repo.path())
        .args(["-m", "7", "--dry-run", "--manifests"])
        .arg(repo.scratch_path("absent.json"))
        .arg("HEAD")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("absent.json"));
}

#[test]
fn test_info_verbosity_logs_active_tags() {
    let repo = SweepRepo::new().unwrap();
    repo.commit_tag("build-1").unwrap();
    let manifests = standard_listing(&repo);

    repo.command()
        .arg("-p")
        .arg(repo.path())
        .args(["-m", "7", "-v", "INFO", "--dry-run", "--manifests"])
        .arg(&manifests)
        .arg("HEAD")
        .assert()
        .success()
        .stderr(predicate::str::contains("Active tags: {build-1}"));
}
