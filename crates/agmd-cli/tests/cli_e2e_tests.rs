//! CLI end-to-end tests that invoke the compiled `agmd` binary.
//!
//! Network access is never required: syncs either have nothing to fetch or
//! point `--api-url` at a closed local port.

use assert_cmd::Command;
use predicates::prelude::*;

use agmd_test_utils::TestProject;

/// Closed port on loopback; connections are refused immediately.
const DEAD_API: &str = "http://127.0.0.1:9";

fn agmd(project: &TestProject) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_agmd"));
    cmd.current_dir(project.root())
        .env_remove("GITHUB_TOKEN")
        .env_remove("AGMD_GITHUB_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn offline(cmd: &mut Command) -> &mut Command {
    cmd.args(["--api-url", DEAD_API, "--timeout", "1", "--retry-window", "0"])
}

// ============================================================================
// Help and version
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let project = TestProject::new();
    agmd(&project)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("sync"));
}

#[test]
fn test_version_flag() {
    let project = TestProject::new();
    agmd(&project)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_command_fails() {
    let project = TestProject::new();
    agmd(&project).arg("frobnicate").assert().failure();
}

// ============================================================================
// init
// ============================================================================

#[test]
fn test_init_creates_manifest_and_ignore_rules() {
    let project = TestProject::with_git();

    agmd(&project)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    project.assert_file_exists("agmd.yml");
    let gitignore = project.read(".gitignore");
    assert!(gitignore.lines().any(|l| l == "AGENTS.md"));
    assert!(gitignore.lines().any(|l| l == "**/.agmd/"));
}

#[test]
fn test_init_renames_shared_files() {
    let project = TestProject::with_git();
    project.write("AGENTS.md", "root notes\n");
    project.write("services/api/AGENTS.md", "api notes\n");

    agmd(&project)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Renamed 2 AGENTS.md file(s)"));

    project.assert_file_not_exists("AGENTS.md");
    project.assert_file_not_exists("services/api/AGENTS.md");
    assert_eq!(project.read("AGENTS.local.md"), "root notes\n");
    assert_eq!(project.read("services/api/AGENTS.local.md"), "api notes\n");
}

#[test]
fn test_init_runs_from_subdirectory() {
    let project = TestProject::with_git();
    project.mkdir("nested/deeper");

    agmd(&project)
        .current_dir(project.path("nested/deeper"))
        .arg("init")
        .assert()
        .success();

    project.assert_file_exists("agmd.yml");
    project.assert_file_not_exists("nested/deeper/agmd.yml");
}

#[test]
fn test_reinit_keeps_manifest_bytes() {
    let project = TestProject::with_git();
    let yaml = "# hand edited\n- path: .\n  mds:\n    - name: acme/guides\n";
    project.write_manifest(yaml);

    agmd(&project)
        .args(["init", "--map", "docs=acme/docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--map ignored"));

    assert_eq!(project.read("agmd.yml"), yaml);
}

#[test]
fn test_init_with_map_seeds_manifest() {
    let project = TestProject::with_git();

    agmd(&project)
        .args(["init", "--map", "docs=acme/docs/tree/v1"])
        .assert()
        .success();

    let manifest = project.read("agmd.yml");
    assert!(manifest.contains("path: docs"), "got:\n{manifest}");
    assert!(manifest.contains("name: acme/docs/tree/v1"), "got:\n{manifest}");
}

#[test]
fn test_init_conflict_fails() {
    let project = TestProject::with_git();
    project.write("AGENTS.md", "shared\n");
    project.write("AGENTS.local.md", "local\n");

    agmd(&project)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));

    assert_eq!(project.read("AGENTS.md"), "shared\n");
    assert_eq!(project.read("AGENTS.local.md"), "local\n");
}

// ============================================================================
// add
// ============================================================================

#[test]
fn test_add_without_manifest_fails() {
    let project = TestProject::with_git();

    agmd(&project)
        .args(["add", "acme/guides", "--no-sync"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("agmd.yml"));
}

#[test]
fn test_add_no_sync_records_source() {
    let project = TestProject::with_git();
    agmd(&project).arg("init").assert().success();

    agmd(&project)
        .args(["add", "acme/guides", "--path", "docs", "--module", "--no-sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added"));

    let manifest = project.read("agmd.yml");
    assert!(manifest.contains("path: docs"), "got:\n{manifest}");
    assert!(manifest.contains("name: acme/guides"), "got:\n{manifest}");
    assert!(manifest.contains("module: true"), "got:\n{manifest}");
    project.assert_file_not_exists("docs/AGENTS.md");
}

#[test]
fn test_add_twice_is_unchanged() {
    let project = TestProject::with_git();
    agmd(&project).arg("init").assert().success();
    agmd(&project)
        .args(["add", "acme/guides", "--no-sync"])
        .assert()
        .success();
    let first = project.read("agmd.yml");

    agmd(&project)
        .args(["add", "acme/guides", "--no-sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already tracked"));

    assert_eq!(project.read("agmd.yml"), first);
}

#[test]
fn test_add_invalid_source_fails() {
    let project = TestProject::with_git();
    agmd(&project).arg("init").assert().success();
    let before = project.read("agmd.yml");

    agmd(&project)
        .args(["add", "not-a-source", "--no-sync"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not-a-source"));

    assert_eq!(project.read("agmd.yml"), before);
}

#[test]
fn test_add_path_outside_project_fails() {
    let project = TestProject::with_git();
    agmd(&project).arg("init").assert().success();

    agmd(&project)
        .args(["add", "acme/guides", "--path", "../elsewhere", "--no-sync"])
        .assert()
        .failure();
}

// ============================================================================
// sync
// ============================================================================

#[test]
fn test_sync_without_manifest_fails() {
    let project = TestProject::with_git();

    agmd(&project)
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("agmd.yml"));
}

#[test]
fn test_sync_empty_manifest_succeeds() {
    let project = TestProject::with_git();
    agmd(&project).arg("init").assert().success();

    agmd(&project)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("No paths configured"));
}

#[test]
fn test_sync_corrupt_manifest_fails() {
    let project = TestProject::with_git();
    project.write_manifest("- path: .\n  bogus: 1\n");

    agmd(&project)
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("bogus"));
}

#[test]
fn test_sync_unreachable_source_reports_failure() {
    let project = TestProject::with_git();
    project.write_manifest("- path: .\n  mds:\n    - name: acme/guides\n");
    project.write("AGENTS.md", "previous output\n");

    offline(&mut agmd(&project).arg("sync"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed"))
        .stdout(predicate::str::contains("acme/guides"))
        .stderr(predicate::str::contains("1 of 1 path(s) failed to sync"));

    assert_eq!(project.read("AGENTS.md"), "previous output\n");
}

#[test]
fn test_sync_entry_with_only_local_content_is_written() {
    let project = TestProject::with_git();
    project.write_manifest("- path: docs\n  mds: []\n");
    project.write("docs/AGENTS.local.md", "docs only\n");

    offline(&mut agmd(&project).arg("sync"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 written"));

    let composed = project.read("docs/AGENTS.md");
    assert!(composed.contains("# agmd local"), "got:\n{composed}");
    assert!(composed.contains("docs only"), "got:\n{composed}");
}

#[test]
fn test_add_then_sync_failure_exits_nonzero() {
    let project = TestProject::with_git();
    agmd(&project).arg("init").assert().success();

    offline(&mut agmd(&project).args(["add", "acme/guides"]))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to sync"));

    // The manifest change is kept even though the sync failed.
    assert!(project.read("agmd.yml").contains("acme/guides"));
}
