// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task admission: validates a request, bootstraps the sandbox, records
//! the fingerprint, and persists the task — the one place a task is
//! allowed to come into existence.

use crate::error::ServiceError;
use crate::request::CreateTaskRequest;
use agentcheck_artifacts::{ArtifactStore, TaskStateSnapshot};
use agentcheck_core::{Task, TaskId, TaskStatus};
use agentcheck_sandbox::{build_fingerprint, SandboxManager};
use agentcheck_storage::TaskRepository;
use std::sync::Arc;
use tracing::{info, warn};

/// Orchestrates task creation against a repository and artifact store.
pub struct TaskService {
    repository: Arc<dyn TaskRepository>,
    artifacts: Arc<ArtifactStore>,
    max_concurrent_running_tasks: usize,
}

impl TaskService {
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        artifacts: Arc<ArtifactStore>,
        max_concurrent_running_tasks: usize,
    ) -> Self {
        Self {
            repository,
            artifacts,
            max_concurrent_running_tasks,
        }
    }

    /// Current count of `Running` tasks, read straight from the
    /// repository rather than an in-process counter: the repository is
    /// the shared source of truth across every process sharing it.
    pub fn running_task_count(&self) -> Result<usize, ServiceError> {
        let tasks = self.repository.list_tasks(usize::MAX)?;
        Ok(tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Running)
            .count())
    }

    /// Whether a new task may be admitted to `Running` right now, given
    /// the configured concurrency ceiling.
    pub fn has_admission_capacity(&self) -> Result<bool, ServiceError> {
        Ok(self.running_task_count()? < self.max_concurrent_running_tasks)
    }

    /// Validates `request`, bootstraps a sandbox workspace when
    /// requested, records the workspace fingerprint, and persists the
    /// resulting task in `Queued` status.
    ///
    /// On any failure after a sandbox was generated, the generated
    /// sandbox is removed; an operator-supplied sandbox path is never
    /// touched.
    pub fn create_task(&self, id: &str, request: CreateTaskRequest) -> Result<Task, ServiceError> {
        let normalized = request.validate(id)?;
        let mut task = normalized.task;

        let sandbox = if task.sandbox_mode {
            let project_name = task
                .project_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("project");
            let sandbox = match normalized.requested_sandbox_path {
                Some(path) => SandboxManager::adopt_explicit(&task.project_path, &path)?,
                None => SandboxManager::create_generated(&task.project_path, project_name)?,
            };
            Some(sandbox)
        } else {
            None
        };

        if let Err(err) = self.finish_create(&mut task, sandbox.as_ref()) {
            if let Some(sandbox) = &sandbox {
                if let Err(cleanup_err) = SandboxManager::remove_if_generated(sandbox) {
                    warn!(
                        task_id = %task.task_id,
                        error = %cleanup_err,
                        "failed to clean up generated sandbox after a failed task creation"
                    );
                }
            }
            return Err(err);
        }

        info!(task_id = %task.task_id, sandbox = task.sandbox_mode, "created task");
        Ok(task)
    }

    fn finish_create(
        &self,
        task: &mut Task,
        sandbox: Option<&agentcheck_sandbox::Sandbox>,
    ) -> Result<(), ServiceError> {
        if let Some(sandbox) = sandbox {
            task.sandbox_workspace_path = Some(sandbox.path.clone());
            task.sandbox_generated = sandbox.generated;
        }

        task.workspace_fingerprint = Some(build_fingerprint(
            &task.project_path,
            &task.workspace_path,
            task.sandbox_workspace_path.as_deref(),
            task.merge_target_path.as_deref(),
        ));

        self.repository.create_task(task.clone())?;
        self.artifacts.ensure_task_dir(task.task_id.as_str())?;
        self.artifacts
            .save_state(&TaskStateSnapshot::from_task(task))?;
        Ok(())
    }

    /// Requests cancellation of a running or waiting task.
    pub fn request_cancel(&self, task_id: &TaskId) -> Result<(), ServiceError> {
        if self.repository.get_task(task_id)?.is_none() {
            return Err(ServiceError::TaskNotFound(task_id.as_str().to_string()));
        }
        self.repository.set_cancel_requested(task_id, true)?;
        Ok(())
    }

    /// Fetches a task, or `ServiceError::TaskNotFound`.
    pub fn get_task(&self, task_id: &TaskId) -> Result<Task, ServiceError> {
        self.repository
            .get_task(task_id)?
            .ok_or_else(|| ServiceError::TaskNotFound(task_id.as_str().to_string()))
    }

    /// Admit a `queued` task to `running` if the concurrency ceiling
    /// allows it; otherwise leave it `queued` with
    /// `last_gate_reason="concurrency_limit"` for the caller to retry.
    /// A no-op (returns the task unchanged) for any other status.
    pub fn try_start(&self, task_id: &TaskId) -> Result<Task, ServiceError> {
        let task = self.get_task(task_id)?;
        if task.status != TaskStatus::Queued {
            return Ok(task);
        }

        if !self.has_admission_capacity()? {
            return Ok(self
                .repository
                .update_task_status(task_id, TaskStatus::Queued, Some("concurrency_limit"), None)?);
        }

        match self.repository.update_task_status_if(
            task_id,
            TaskStatus::Queued,
            TaskStatus::Running,
            None,
            None,
            None,
        )? {
            Some(task) => Ok(task),
            None => self.get_task(task_id),
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
