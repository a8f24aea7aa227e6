use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Binary with an isolated (absent) config file
fn spacesweep(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("spacesweep").unwrap();
    cmd.env("SPACESWEEP_CONFIG", workdir.join("config.toml"))
        .env("NO_COLOR", "1");
    cmd
}

fn write_kb(path: &Path, kb: usize) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, vec![9u8; kb * 1024]).unwrap();
}

/// A tree with one dependency folder and one build cache
fn project_tree() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("code");
    write_kb(&root.join("web/node_modules/react/index.js"), 400);
    write_kb(&root.join("web/src/app.js"), 2);
    write_kb(&root.join("svc/.mypy_cache/3.12/cache.json"), 300);
    (dir, root)
}

// ─── Help & version ──────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    spacesweep(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("clean"))
        .stdout(predicate::str::contains("patterns"));
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    spacesweep(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("spacesweep"));
}

// ─── Analyze ─────────────────────────────────────────────────────────────────

#[test]
fn test_analyze_json_lists_groups() {
    let (dir, root) = project_tree();
    spacesweep(dir.path())
        .args(["analyze", "--format", "json"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"key\": \"node_modules\""))
        .stdout(predicate::str::contains("\"key\": \".mypy_cache\""))
        .stdout(predicate::str::contains("\"tier\": \"urgent\""))
        .stdout(predicate::str::contains("\"clean_system\": false"));
}

#[test]
fn test_analyze_human_output() {
    let (dir, root) = project_tree();
    spacesweep(dir.path())
        .args(["analyze", "--no-color"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("node_modules"))
        .stdout(predicate::str::contains("400.0 KB"))
        .stdout(predicate::str::contains("Total reclaimable"));
}

#[test]
fn test_analyze_quiet_output() {
    let (dir, root) = project_tree();
    spacesweep(dir.path())
        .args(["analyze", "--quiet"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("400\t1\tnode_modules"));
}

#[test]
fn test_analyze_clean_tree() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("empty-project");
    write_kb(&root.join("README.md"), 1);
    spacesweep(dir.path())
        .args(["analyze", "--no-color"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("clean"));
}

#[test]
fn test_analyze_largest() {
    let (dir, root) = project_tree();
    spacesweep(dir.path())
        .args(["analyze", "--largest", "--format", "json"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("web"))
        .stdout(predicate::str::contains("\"rank\": 1"));
}

#[test]
fn test_analyze_missing_root_fails_with_hint() {
    let dir = TempDir::new().unwrap();
    spacesweep(dir.path())
        .arg("analyze")
        .arg(dir.path().join("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid root"));
}

#[test]
fn test_malformed_config_is_fatal() {
    let (dir, root) = project_tree();
    std::fs::write(dir.path().join("config.toml"), "display_limit = \"lots\"").unwrap();
    spacesweep(dir.path())
        .arg("analyze")
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}

// ─── Clean ───────────────────────────────────────────────────────────────────

#[test]
fn test_clean_dry_run_keeps_files() {
    let (dir, root) = project_tree();
    spacesweep(dir.path())
        .args(["clean", "--dry-run", "--format", "json"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dry_run\": true"))
        .stdout(predicate::str::contains("\"total_freed_kb\": 0"))
        .stdout(predicate::str::contains("\"total_reclaimable_kb\": 700"));

    assert!(root.join("web/node_modules/react/index.js").exists());
    assert!(root.join("svc/.mypy_cache/3.12/cache.json").exists());
}

#[test]
fn test_clean_with_yes_deletes_artifacts() {
    let (dir, root) = project_tree();
    spacesweep(dir.path())
        .args(["clean", "--yes", "--format", "json"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_freed_kb\": 700"));

    assert!(!root.join("web/node_modules").exists());
    assert!(!root.join("svc/.mypy_cache").exists());
    assert!(root.join("web/src/app.js").exists());
}

#[test]
fn test_clean_without_answer_deletes_nothing() {
    let (dir, root) = project_tree();
    spacesweep(dir.path())
        .args(["clean", "--no-color"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped"));

    assert!(root.join("web/node_modules/react/index.js").exists());
}

#[test]
fn test_clean_interactive_yes() {
    let (dir, root) = project_tree();
    spacesweep(dir.path())
        .args(["clean", "--no-color"])
        .arg(&root)
        .write_stdin("y\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Freed"));

    assert!(!root.join("web/node_modules").exists());
    assert!(root.join("svc/.mypy_cache/3.12/cache.json").exists());
}

#[test]
fn test_clean_json_requires_yes() {
    let (dir, root) = project_tree();
    spacesweep(dir.path())
        .args(["clean", "--format", "json"])
        .arg(&root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    assert!(root.join("web/node_modules").exists());
}

#[test]
fn test_clean_writes_action_log() {
    let (dir, root) = project_tree();
    let log = dir.path().join("logs/actions.log");
    spacesweep(dir.path())
        .args(["clean", "--dry-run", "--yes", "--quiet"])
        .arg(format!("--log={}", log.display()))
        .arg(&root)
        .assert()
        .success();

    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(contents.contains("cleanup started"));
    assert!(contents.contains("confirmation"));
}

// ─── Patterns, config, completions ───────────────────────────────────────────

#[test]
fn test_patterns_lists_catalog() {
    let dir = TempDir::new().unwrap();
    spacesweep(dir.path())
        .args(["patterns", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("node_modules"))
        .stdout(predicate::str::contains("vendor/bundle"))
        .stdout(predicate::str::contains(".local/share/Trash"));
}

#[test]
fn test_config_set_clamps_and_persists() {
    let dir = TempDir::new().unwrap();
    spacesweep(dir.path())
        .args(["config", "set", "display_limit", "5"])
        .assert()
        .success();

    spacesweep(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("display_limit = 10"));
}

#[test]
fn test_config_set_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    spacesweep(dir.path())
        .args(["config", "set", "nonexistent_key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent_key"));
}

#[test]
fn test_config_path_honours_override() {
    let dir = TempDir::new().unwrap();
    spacesweep(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();
    spacesweep(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spacesweep"));
}
