//! Integration tests for Nodepack

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn nodepack() -> Command {
        cargo_bin_cmd!("nodepack")
    }

    fn project(manifest: &str) -> (TempDir, TempDir, TempDir) {
        let build = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let envd = TempDir::new().unwrap();
        std::fs::write(build.path().join("package.json"), manifest).unwrap();
        (build, cache, envd)
    }

    fn build_args(build: &Path, cache: &Path, envd: &Path) -> Vec<String> {
        vec![
            "build".to_string(),
            build.display().to_string(),
            cache.display().to_string(),
            envd.display().to_string(),
        ]
    }

    #[test]
    fn help_displays() {
        nodepack()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Reproducible Node.js"));
    }

    #[test]
    fn version_displays() {
        nodepack()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("nodepack"));
    }

    #[test]
    fn detect_node_project() {
        let (build, _cache, _envd) = project(r#"{"name": "web-shop"}"#);

        nodepack()
            .args(["detect", &build.path().display().to_string()])
            .assert()
            .success()
            .stdout(predicate::str::contains("web-shop"));
    }

    #[test]
    fn detect_rejects_missing_manifest() {
        let build = TempDir::new().unwrap();

        nodepack()
            .args(["detect", &build.path().display().to_string()])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No package.json"));
    }

    #[test]
    fn build_rejects_conflicting_lockfiles() {
        let (build, cache, envd) = project("{}");
        std::fs::write(build.path().join("yarn.lock"), "").unwrap();
        std::fs::write(build.path().join("package-lock.json"), "{}").unwrap();

        nodepack()
            .args(build_args(build.path(), cache.path(), envd.path()))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Two different lockfiles found"));
    }

    #[test]
    fn build_rejects_invalid_manifest() {
        let (build, cache, envd) = project("{not json");

        nodepack()
            .args(build_args(build.path(), cache.path(), envd.path()))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unable to parse package.json"));
    }

    #[test]
    fn build_rejects_nested_internal_dir() {
        let (build, cache, envd) = project("{}");
        std::fs::create_dir(build.path().join(".nodepack")).unwrap();

        nodepack()
            .args(build_args(build.path(), cache.path(), envd.path()))
            .assert()
            .failure()
            .stderr(predicate::str::contains(".nodepack directory checked into"));
    }

    #[test]
    fn build_rejects_missing_env_dir() {
        let (build, cache, envd) = project("{}");
        let missing = envd.path().join("gone");

        nodepack()
            .args(build_args(build.path(), cache.path(), &missing))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Path not found"));
    }

    #[test]
    fn build_rejects_missing_build_dir() {
        let cache = TempDir::new().unwrap();
        let envd = TempDir::new().unwrap();
        let missing = cache.path().join("gone");

        nodepack()
            .args(build_args(&missing, cache.path(), envd.path()))
            .assert()
            .failure()
            .stderr(predicate::str::contains("No package.json"));
    }
}
