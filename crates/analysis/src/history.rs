// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task history: the aggregate of findings, revisions, disputes, and
//! next steps a presentation layer needs to render one task's story.

use crate::disputes::{extract_disputes, Dispute};
use crate::error::AnalysisError;
use crate::findings::extract_core_findings;
use crate::next_steps::derive_next_steps;
use crate::revisions::{extract_revisions, RevisionsSummary};
use agentcheck_artifacts::ArtifactStore;
use agentcheck_core::TaskId;
use agentcheck_storage::TaskRepository;
use serde::{Deserialize, Serialize};

/// The full analysed history of one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHistory {
    pub task_id: String,
    pub status: String,
    pub core_findings: Vec<String>,
    pub revisions: RevisionsSummary,
    pub disputes: Vec<Dispute>,
    pub next_steps: Vec<String>,
}

/// Build the full history for `task_id`: reads the task row and its
/// event log from `repository`, and its markdown/artifact files from
/// `artifacts`.
pub fn build_task_history(
    repository: &dyn TaskRepository,
    artifacts: &ArtifactStore,
    task_id: &TaskId,
) -> Result<TaskHistory, AnalysisError> {
    let task = repository
        .get_task(task_id)?
        .ok_or_else(|| AnalysisError::TaskNotFound(task_id.as_str().to_string()))?;
    let events = repository.list_events(task_id)?;

    let core_findings = extract_core_findings(
        artifacts,
        task_id.as_str(),
        &events,
        task.last_gate_reason.as_deref(),
    );
    let revisions = extract_revisions(artifacts, task_id.as_str(), &events);
    let disputes = extract_disputes(&events);
    let next_steps = derive_next_steps(task.status, task.last_gate_reason.as_deref(), &disputes);

    Ok(TaskHistory {
        task_id: task_id.as_str().to_string(),
        status: task.status.to_string(),
        core_findings,
        revisions,
        disputes,
        next_steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcheck_core::test_support::sample_task;
    use agentcheck_core::{TaskEventKind, TaskStatus};
    use agentcheck_storage::InMemoryTaskRepository;
    use tempfile::TempDir;

    #[test]
    fn builds_a_full_history_for_a_failed_gate_task() {
        let repo = InMemoryTaskRepository::new();
        let mut task = sample_task("task-1");
        task.status = TaskStatus::FailedGate;
        task.last_gate_reason = Some("review_blocker".to_string());
        repo.create_task(task.clone()).expect("creates");
        repo.update_task_status(
            &task.task_id,
            TaskStatus::FailedGate,
            Some("review_blocker"),
            Some(1),
        )
        .expect("updates");
        repo.append_event(
            &task.task_id,
            TaskEventKind::Review {
                participant: "codex#reviewer-1".to_string(),
                verdict: agentcheck_core::ReviewVerdict::Blocker,
                output: "this is risky".to_string(),
            },
            Some(1),
        )
        .expect("appends");

        let dir = TempDir::new().expect("tempdir");
        let artifacts = ArtifactStore::new(dir.path());

        let history = build_task_history(&repo, &artifacts, &task.task_id).expect("builds");
        assert_eq!(history.status, "failed_gate");
        assert_eq!(history.disputes.len(), 1);
        assert!(!history.revisions.auto_merge);
        assert!(history.next_steps[0].contains("blocker/unknown"));
    }

    #[test]
    fn missing_task_is_an_error() {
        let repo = InMemoryTaskRepository::new();
        let dir = TempDir::new().expect("tempdir");
        let artifacts = ArtifactStore::new(dir.path());
        let result = build_task_history(&repo, &artifacts, &TaskId::from("missing"));
        assert!(matches!(result, Err(AnalysisError::TaskNotFound(_))));
    }
}
