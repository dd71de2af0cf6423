// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task repository contract. Two implementations exist:
//! [`crate::SqliteTaskRepository`] (durable) and
//! [`crate::InMemoryTaskRepository`] (tests).

use crate::error::StorageError;
use agentcheck_core::{Task, TaskEvent, TaskEventKind, TaskId, TaskStatus};

/// Persists tasks and their append-only event logs with ACID semantics
/// and concurrency-safe status transitions.
pub trait TaskRepository: Send + Sync {
    fn create_task(&self, task: Task) -> Result<(), StorageError>;

    fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StorageError>;

    fn list_tasks(&self, limit: usize) -> Result<Vec<Task>, StorageError>;

    /// Unconditional update. Raises `NotFound` if the task doesn't exist.
    fn update_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        reason: Option<&str>,
        rounds_completed: Option<u32>,
    ) -> Result<Task, StorageError>;

    /// Optimistic compare-and-set: only applies if the task's current
    /// status equals `expected_status`. Returns `Ok(None)` on mismatch
    /// (another writer already moved it) and `Err(NotFound)` if the task
    /// doesn't exist.
    #[allow(clippy::too_many_arguments)]
    fn update_task_status_if(
        &self,
        id: &TaskId,
        expected_status: TaskStatus,
        new_status: TaskStatus,
        reason: Option<&str>,
        rounds_completed: Option<u32>,
        set_cancel_requested: Option<bool>,
    ) -> Result<Option<Task>, StorageError>;

    fn set_cancel_requested(&self, id: &TaskId, requested: bool) -> Result<(), StorageError>;

    fn is_cancel_requested(&self, id: &TaskId) -> Result<bool, StorageError>;

    /// Append an event, atomically reserving the next sequence number for
    /// this task. Returns the persisted event (with its assigned `seq`).
    fn append_event(
        &self,
        id: &TaskId,
        kind: TaskEventKind,
        round: Option<u32>,
    ) -> Result<TaskEvent, StorageError>;

    fn list_events(&self, id: &TaskId) -> Result<Vec<TaskEvent>, StorageError>;

    /// Delete tasks and cascade their events and sequence counters.
    fn delete_tasks(&self, ids: &[TaskId]) -> Result<(), StorageError>;
}
