// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agentcheck_core::test_support::sample_task;
use agentcheck_core::TaskEventKind;
use std::sync::Arc;
use std::thread;

fn repo() -> SqliteTaskRepository {
    SqliteTaskRepository::open_in_memory().expect("opens")
}

#[test]
fn create_and_get_round_trips() {
    let repo = repo();
    let task = sample_task("task-1");
    repo.create_task(task.clone()).expect("creates");
    let fetched = repo.get_task(&task.task_id).expect("reads").expect("present");
    assert_eq!(fetched.task_id, task.task_id);
    assert_eq!(fetched.status, TaskStatus::Queued);
}

#[test]
fn get_missing_task_returns_none() {
    let repo = repo();
    assert!(repo.get_task(&TaskId::new("nope")).expect("reads").is_none());
}

#[test]
fn update_status_unconditional_requires_existing_task() {
    let repo = repo();
    let err = repo
        .update_task_status(&TaskId::new("nope"), TaskStatus::Running, None, None)
        .expect_err("missing task");
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[test]
fn update_status_unconditional_sets_reason_and_rounds() {
    let repo = repo();
    let task = sample_task("task-2");
    repo.create_task(task.clone()).expect("creates");

    let updated = repo
        .update_task_status(&task.task_id, TaskStatus::Running, Some("started"), Some(1))
        .expect("updates");
    assert_eq!(updated.status, TaskStatus::Running);
    assert_eq!(updated.last_gate_reason.as_deref(), Some("started"));
    assert_eq!(updated.rounds_completed, 1);
}

#[test]
fn cas_transition_succeeds_once() {
    let repo = repo();
    let task = sample_task("task-3");
    repo.create_task(task.clone()).expect("creates");

    let result = repo
        .update_task_status_if(
            &task.task_id,
            TaskStatus::Queued,
            TaskStatus::Running,
            None,
            None,
            None,
        )
        .expect("no storage error");
    assert!(result.is_some());

    let mismatch = repo
        .update_task_status_if(
            &task.task_id,
            TaskStatus::Queued,
            TaskStatus::Running,
            None,
            None,
            None,
        )
        .expect("no storage error");
    assert!(mismatch.is_none(), "second CAS with stale expected_status must no-op");
}

#[test]
fn concurrent_cas_exactly_one_winner() {
    let repo = Arc::new(repo());
    let task = sample_task("task-4");
    repo.create_task(task.clone()).expect("creates");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let id = task.task_id.clone();
            thread::spawn(move || {
                repo.update_task_status_if(
                    &id,
                    TaskStatus::Queued,
                    TaskStatus::Running,
                    None,
                    None,
                    None,
                )
                .expect("no storage error")
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().expect("thread completes"))
        .filter(|r| r.is_some())
        .count();
    assert_eq!(winners, 1);
}

#[test]
fn append_event_assigns_gapfree_sequence() {
    let repo = repo();
    let task = sample_task("task-5");
    repo.create_task(task.clone()).expect("creates");

    for _ in 0..5 {
        repo.append_event(
            &task.task_id,
            TaskEventKind::HistoryEvent {
                message: "tick".to_string(),
            },
            None,
        )
        .expect("appends");
    }

    let events = repo.list_events(&task.task_id).expect("lists");
    let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
}

#[test]
fn concurrent_append_event_produces_exactly_1_to_n() {
    let repo = Arc::new(repo());
    let task = sample_task("task-6");
    repo.create_task(task.clone()).expect("creates");

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let id = task.task_id.clone();
            thread::spawn(move || {
                repo.append_event(
                    &id,
                    TaskEventKind::HistoryEvent {
                        message: "tick".to_string(),
                    },
                    None,
                )
                .expect("appends")
            })
        })
        .collect();

    let mut seqs: Vec<u64> = handles
        .into_iter()
        .map(|h| h.join().expect("thread completes").seq)
        .collect();
    seqs.sort_unstable();
    assert_eq!(seqs, (1..=50).collect::<Vec<_>>());
}

#[test]
fn delete_tasks_cascades_events() {
    let repo = repo();
    let task = sample_task("task-7");
    repo.create_task(task.clone()).expect("creates");
    repo.append_event(
        &task.task_id,
        TaskEventKind::HistoryEvent {
            message: "tick".to_string(),
        },
        None,
    )
    .expect("appends");

    repo.delete_tasks(&[task.task_id.clone()]).expect("deletes");
    assert!(repo.get_task(&task.task_id).expect("reads").is_none());
    assert!(repo.list_events(&task.task_id).expect("reads").is_empty());
}

#[test]
fn timestamps_round_trip_with_timezone_designator() {
    let repo = repo();
    let task = sample_task("task-8");
    repo.create_task(task.clone()).expect("creates");
    let fetched = repo.get_task(&task.task_id).expect("reads").expect("present");
    assert!(fetched.created_at.to_rfc3339().contains('+') || fetched.created_at.to_rfc3339().ends_with('Z'));
}

#[test]
fn cancel_requested_is_sticky_until_terminal() {
    let repo = repo();
    let task = sample_task("task-9");
    repo.create_task(task.clone()).expect("creates");
    repo.set_cancel_requested(&task.task_id, true).expect("sets");
    assert!(repo.is_cancel_requested(&task.task_id).expect("reads"));

    repo.update_task_status(&task.task_id, TaskStatus::Passed, Some("passed"), None)
        .expect("updates");
    repo.set_cancel_requested(&task.task_id, true).expect("no-op on terminal");
}
