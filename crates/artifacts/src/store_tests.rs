// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agentcheck_core::test_support::sample_task;
use agentcheck_core::TaskEventKind;
use agentcheck_core::TaskId;
use chrono::Utc;
use tempfile::TempDir;

fn store() -> (TempDir, ArtifactStore) {
    let dir = TempDir::new().expect("tempdir");
    let store = ArtifactStore::new(dir.path());
    (dir, store)
}

#[test]
fn save_and_load_state_round_trips() {
    let (_dir, store) = store();
    let task = sample_task("task-1");
    let snapshot = TaskStateSnapshot::from_task(&task);
    store.save_state(&snapshot).expect("saves");

    let loaded = store.load_state("task-1").expect("loads").expect("present");
    assert_eq!(loaded.task_id, "task-1");
    assert_eq!(loaded.status, task.status);
}

#[test]
fn load_state_missing_returns_none() {
    let (_dir, store) = store();
    assert!(store.load_state("nope").expect("loads").is_none());
}

#[test]
fn append_event_line_writes_jsonl() {
    let (_dir, store) = store();
    store.ensure_task_dir("task-2").expect("creates dir");
    let event = TaskEvent {
        task_id: TaskId::new("task-2"),
        seq: 1,
        kind: TaskEventKind::Discussion {
            participant: "claude#author".to_string(),
            output: "proposal text".to_string(),
        },
        round: Some(1),
        created_at: Utc::now(),
    };
    store.append_event_line(&event).expect("appends");
    store.append_event_line(&event).expect("appends again");

    let events = store.read_event_lines("task-2").expect("reads");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].seq, 1);
}

#[test]
fn read_event_lines_skips_corrupt_lines() {
    let (_dir, store) = store();
    let dir = store.ensure_task_dir("task-3").expect("creates");
    let path = dir.join("events.jsonl");
    std::fs::write(&path, "not json\n{\"bad\": true}\n").expect("writes");
    let events = store.read_event_lines("task-3").expect("reads");
    assert!(events.is_empty());
}

#[test]
fn markdown_round_trips() {
    let (_dir, store) = store();
    store.write_markdown("task-4", "summary.md", "# Summary\n").expect("writes");
    let content = store.read_markdown("task-4", "summary.md").expect("reads").expect("present");
    assert_eq!(content, "# Summary\n");
}

#[test]
fn artifact_round_trips() {
    let (_dir, store) = store();
    let value = serde_json::json!({"mode": "cross_repo"});
    store.write_artifact("task-5", "auto_merge_summary", &value).expect("writes");
    let loaded = store
        .read_artifact("task-5", "auto_merge_summary")
        .expect("reads")
        .expect("present");
    assert_eq!(loaded, value);

    let names = store.list_artifact_names("task-5").expect("lists");
    assert_eq!(names, vec!["auto_merge_summary".to_string()]);
}

#[test]
fn artifact_name_rejects_path_traversal() {
    let (_dir, store) = store();
    let value = serde_json::json!({});
    let err = store.write_artifact("task-6", "../escape", &value).expect_err("rejected");
    assert!(matches!(err, ArtifactError::InvalidName(_)));

    let err = store.write_artifact("task-6", "a/b", &value).expect_err("rejected");
    assert!(matches!(err, ArtifactError::InvalidName(_)));
}

#[test]
fn atomic_write_leaves_no_tmp_file_behind() {
    let (_dir, store) = store();
    store.write_markdown("task-7", "discussion.md", "hello").expect("writes");
    let dir = store.ensure_task_dir("task-7").expect("dir");
    assert!(!dir.join("discussion.md.tmp").exists());
    assert!(dir.join("discussion.md").exists());
}
