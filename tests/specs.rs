//! Behavioral specifications for the `agentcheck` CLI.
//!
//! Black-box: invokes the built binary against a temp workspace and
//! verifies stdout/exit codes, the way the teacher's `tests/specs.rs`
//! drives `oj`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn agentcheck() -> Command {
    Command::cargo_bin("agentcheck").expect("binary builds")
}

/// A disposable project, artifact root, and SQLite file, with `AWE_*`
/// env wired so each test gets its own isolated state that persists
/// across the several CLI invocations one scenario makes.
struct Fixture {
    _root: TempDir,
    workspace: TempDir,
    artifact_root_path: std::path::PathBuf,
    database_path: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().expect("tempdir");
        let workspace = TempDir::new().expect("tempdir");
        let artifact_root_path = root.path().join("artifacts");
        let database_path = root.path().join("agentcheck.sqlite3");
        Self {
            _root: root,
            workspace,
            artifact_root_path,
            database_path,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = agentcheck();
        cmd.env("AWE_DATABASE_URL", &self.database_path)
            .env("AWE_ARTIFACT_ROOT", &self.artifact_root_path)
            .env("AWE_DRY_RUN", "true");
        cmd
    }
}

#[test]
fn creates_and_shows_a_task() {
    let fixture = Fixture::new();

    let output = fixture
        .cmd()
        .args(["-o", "json", "task", "create"])
        .args(["--title", "fix the flaky test"])
        .args(["--author", "claude:author"])
        .args(["--reviewer", "codex:reviewer-1"])
        .args(["--workspace-path"])
        .arg(fixture.workspace.path())
        .args(["--max-rounds", "1"])
        .output()
        .expect("runs");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let created: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let task_id = created["task_id"].as_str().expect("task_id").to_string();
    assert_eq!(created["status"], "queued");

    let show = fixture
        .cmd()
        .args(["-o", "json", "task", "show", &task_id])
        .output()
        .expect("runs");
    assert!(show.status.success());
    let shown: Value = serde_json::from_slice(&show.stdout).expect("valid json");
    assert_eq!(shown["task_id"], task_id);
    assert_eq!(shown["title"], "fix the flaky test");
}

#[test]
fn rejects_a_task_with_an_unknown_participant_provider() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["task", "create"])
        .args(["--title", "bad provider"])
        .args(["--author", "notaprovider:author"])
        .args(["--workspace-path"])
        .arg(fixture.workspace.path())
        .assert()
        .failure();
}

#[test]
fn cancel_requests_cancellation_of_a_queued_task() {
    let fixture = Fixture::new();

    let output = fixture
        .cmd()
        .args(["-o", "json", "task", "create"])
        .args(["--title", "cancel me"])
        .args(["--author", "claude:author"])
        .args(["--workspace-path"])
        .arg(fixture.workspace.path())
        .output()
        .expect("runs");
    assert!(output.status.success());
    let created: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let task_id = created["task_id"].as_str().expect("task_id").to_string();

    fixture
        .cmd()
        .args(["task", "cancel", &task_id])
        .assert()
        .success()
        .stdout(contains("cancellation requested"));
}

#[test]
fn status_reports_zero_tasks_for_a_fresh_artifact_root() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["-o", "json", "status"])
        .assert()
        .success()
        .stdout(contains("\"total_tasks\": 0"));
}

#[test]
fn analysis_history_errors_for_an_unknown_task() {
    let fixture = Fixture::new();

    fixture
        .cmd()
        .args(["analysis", "history", "does-not-exist"])
        .assert()
        .failure()
        .stderr(contains("task not found"));
}
