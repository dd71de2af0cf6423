// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agentcheck_core::test_support::sample_task;
use agentcheck_core::TaskStatus;
use agentcheck_storage::InMemoryTaskRepository;

#[test]
fn empty_repository_reports_empty_report() {
    let repo = InMemoryTaskRepository::new();
    let report = compute_reviewer_drift(&repo, 300).expect("computes");
    assert_eq!(report.window_tasks, 0);
    assert!(report.reviewer_drift.is_empty());
}

#[test]
fn buckets_failed_gate_tasks_by_reason() {
    let repo = InMemoryTaskRepository::new();
    let mut task = sample_task("t1");
    task.status = TaskStatus::FailedGate;
    task.last_gate_reason = Some("review_blocker".to_string());
    repo.create_task(task.clone()).expect("creates");
    repo.update_task_status(&task.task_id, TaskStatus::Running, None, None)
        .expect("updates");
    repo.update_task_status(
        &task.task_id,
        TaskStatus::FailedGate,
        Some("review_blocker"),
        Some(1),
    )
    .expect("updates");

    let report = compute_reviewer_drift(&repo, 300).expect("computes");
    assert_eq!(report.window_failed_gate, 1);
    assert_eq!(report.failure_taxonomy[0].bucket, "review_blocker");
    assert_eq!(report.failure_taxonomy[0].share, 1.0);
}

#[test]
fn reviewer_drift_scores_the_outlier_highest() {
    let repo = InMemoryTaskRepository::new();
    let task = sample_task("t1");
    repo.create_task(task.clone()).expect("creates");

    repo.append_event(
        &task.task_id,
        TaskEventKind::Review {
            participant: "codex#reviewer-1".to_string(),
            verdict: ReviewVerdict::NoBlocker,
            output: "fine".to_string(),
        },
        Some(1),
    )
    .expect("appends");
    repo.append_event(
        &task.task_id,
        TaskEventKind::Review {
            participant: "gemini#reviewer-2".to_string(),
            verdict: ReviewVerdict::Blocker,
            output: "no".to_string(),
        },
        Some(1),
    )
    .expect("appends");
    repo.append_event(
        &task.task_id,
        TaskEventKind::Review {
            participant: "gemini#reviewer-2".to_string(),
            verdict: ReviewVerdict::Blocker,
            output: "still no".to_string(),
        },
        Some(1),
    )
    .expect("appends");

    let report = compute_reviewer_drift(&repo, 300).expect("computes");
    assert_eq!(report.reviewer_drift[0].participant, "gemini#reviewer-2");
    assert!(report.reviewer_drift[0].drift_score > report.reviewer_drift[1].drift_score);
}

#[test]
fn reason_bucket_matches_the_closed_vocabulary() {
    assert_eq!(reason_bucket(Some("tests_failed")), Some("tests_failed"));
    assert_eq!(
        reason_bucket(Some("workflow_error: provider_limit provider=claude")),
        Some("provider_limit")
    );
    assert_eq!(reason_bucket(Some("something bespoke")), Some("other"));
    assert_eq!(reason_bucket(None), None);
}
