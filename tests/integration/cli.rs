use assert_cmd::Command;
use predicates::prelude::*;
use prefetch_cli::cache::Cache;

use crate::common::TestProject;

fn prefetch(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("prefetch").unwrap();
    cmd.current_dir(project.fixture.path())
        .env_remove("PREFETCH_OFFLINE")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_plan_text() {
    let project = TestProject::new(false).unwrap();

    prefetch(&project)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Index manifests (3)"))
        .stdout(predicate::str::contains("Artifacts (3)"))
        .stdout(predicate::str::contains(project.jre_292.as_str()))
        .stdout(predicate::str::contains(project.jre_282.as_str()).not())
        .stdout(predicate::str::contains("Unresolved").not());
}

#[test]
fn test_plan_json() {
    let project = TestProject::with_versions(false, "11.+", "9.0.+").unwrap();

    let output = prefetch(&project).args(["plan", "--format", "json"]).assert().success();
    let plan: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();

    assert_eq!(plan["manifest_uris"].as_array().unwrap().len(), 3);
    assert_eq!(
        plan["artifact_uris"],
        serde_json::json!([project.tomcat_9_0_41, project.lifecycle])
    );
    assert_eq!(plan["unresolved"][0]["version"], "11.+");
    assert_eq!(plan["unresolved"][0]["platform"], "bionic");
    assert_eq!(plan["unresolved"][0]["architecture"], "x86_64");
}

#[test]
fn test_package_without_offline_is_a_no_op() {
    let project = TestProject::new(false).unwrap();

    prefetch(&project)
        .arg("package")
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline packaging is disabled"));

    assert!(!project.cache_dir().exists());
}

#[test]
fn test_package_offline_flag_fills_cache() {
    let project = TestProject::new(false).unwrap();

    prefetch(&project)
        .args(["package", "--offline", "--max-parallel", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Cached 6 file(s)"));

    let cache = Cache::new(project.cache_dir()).unwrap();
    assert!(cache.cache_path(&project.jre_292).exists());
    assert!(cache.cache_path(&project.tomcat_9_0_41).exists());
    assert!(!cache.cache_path(&project.tomcat_10).exists());
}

#[test]
fn test_package_offline_from_environment() {
    let project = TestProject::new(false).unwrap();

    prefetch(&project)
        .env("PREFETCH_OFFLINE", "true")
        .arg("package")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cached 6 file(s)"));

    assert!(Cache::new(project.cache_dir()).unwrap().cache_path(&project.lifecycle).exists());
}

#[test]
fn test_package_reports_unresolved_versions() {
    let project = TestProject::with_versions(true, "1.8.0_+", "7.+").unwrap();

    prefetch(&project)
        .arg("package")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cached 5 file(s)"))
        .stdout(predicate::str::contains("1 version(s) could not be resolved"))
        .stderr(predicate::str::contains("Unable to resolve version '7.+'"));
}

#[test]
fn test_settings_flag() {
    let project = TestProject::new(true).unwrap();
    let elsewhere = tempfile::TempDir::new().unwrap();

    Command::cargo_bin("prefetch")
        .unwrap()
        .current_dir(elsewhere.path())
        .env_remove("PREFETCH_OFFLINE")
        .arg("--settings")
        .arg(project.fixture.settings_path())
        .arg("package")
        .assert()
        .success();

    assert!(project.cache_dir().exists());
    assert!(!elsewhere.path().join("build").exists());
}

#[test]
fn test_missing_repository_configuration_fails() {
    let project = TestProject::new(true).unwrap();
    std::fs::remove_file(project.fixture.config_dir().join("repository.yml")).unwrap();

    prefetch(&project)
        .arg("package")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration 'repository' not found"));
}

#[test]
fn test_invalid_settings_fail() {
    let project = TestProject::new(true).unwrap();
    project.fixture.write_settings("max_parallel = 0\n").unwrap();

    prefetch(&project)
        .arg("plan")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("max_parallel must be greater than zero"));
}

#[test]
fn test_quiet_suppresses_logs() {
    let project = TestProject::with_versions(true, "1.8.0_+", "7.+").unwrap();

    prefetch(&project)
        .args(["--quiet", "package"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Unable to resolve").not());
}
