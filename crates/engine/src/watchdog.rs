// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The watchdog: force-fails tasks that have sat in `running` past a
//! configurable timeout. The engine never self-polls; the Automation
//! Driver calls [`watchdog_sweep`] on each tick.

use agentcheck_core::{TaskId, TaskStatus};
use agentcheck_storage::{StorageError, TaskRepository};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::warn;

/// Upper bound on tasks inspected per sweep; large enough that no real
/// deployment has more concurrently-running tasks than this.
const SWEEP_LIMIT: usize = 10_000;

/// Scan every `running` task and force-fail ones whose `updated_at` is
/// older than `task_timeout`. Returns the ids force-failed.
pub fn watchdog_sweep(
    repository: &dyn TaskRepository,
    task_timeout: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<TaskId>, StorageError> {
    let mut failed = Vec::new();
    for task in repository.list_tasks(SWEEP_LIMIT)? {
        if task.status != TaskStatus::Running {
            continue;
        }
        let age = now.signed_duration_since(task.updated_at);
        let timeout_seconds = task_timeout.as_secs() as i64;
        if age.num_seconds() < timeout_seconds {
            continue;
        }

        let reason = format!(
            "watchdog_timeout: task exceeded {timeout_seconds}s without terminal status"
        );
        let result = repository.update_task_status_if(
            &task.task_id,
            TaskStatus::Running,
            TaskStatus::FailedSystem,
            Some(&reason),
            None,
            None,
        )?;
        if result.is_some() {
            warn!(task_id = %task.task_id, timeout_seconds, "watchdog force-failed stalled task");
            failed.push(task.task_id);
        }
    }
    Ok(failed)
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;
