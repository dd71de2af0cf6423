// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-process equivalent of the SQLite repository, used by tests and
//! by the dry-run CLI path.

use crate::error::StorageError;
use crate::repository::TaskRepository;
use agentcheck_core::{Clock, SystemClock, Task, TaskEvent, TaskEventKind, TaskId, TaskStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

struct Inner {
    tasks: HashMap<String, Task>,
    events: HashMap<String, Vec<TaskEvent>>,
    next_seq: HashMap<String, u64>,
}

/// A `parking_lot`-guarded in-memory task store with the same
/// CAS/sequencing semantics as the SQLite backend.
pub struct InMemoryTaskRepository {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryTaskRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                tasks: HashMap::new(),
                events: HashMap::new(),
                next_seq: HashMap::new(),
            }),
            clock,
        }
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn create_task(&self, task: Task) -> Result<(), StorageError> {
        let mut guard = self.inner.lock();
        guard.tasks.insert(task.task_id.as_str().to_string(), task);
        Ok(())
    }

    fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StorageError> {
        Ok(self.inner.lock().tasks.get(id.as_str()).cloned())
    }

    fn list_tasks(&self, limit: usize) -> Result<Vec<Task>, StorageError> {
        let guard = self.inner.lock();
        let mut tasks: Vec<Task> = guard.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks.truncate(limit);
        Ok(tasks)
    }

    fn update_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        reason: Option<&str>,
        rounds_completed: Option<u32>,
    ) -> Result<Task, StorageError> {
        let mut guard = self.inner.lock();
        let now = self.clock.now();
        let task = guard
            .tasks
            .get_mut(id.as_str())
            .ok_or_else(|| StorageError::NotFound(id.as_str().to_string()))?;
        task.status = status;
        if let Some(r) = reason {
            task.last_gate_reason = Some(r.to_string());
        }
        if let Some(rc) = rounds_completed {
            task.rounds_completed = rc;
        }
        task.updated_at = now;
        Ok(task.clone())
    }

    fn update_task_status_if(
        &self,
        id: &TaskId,
        expected_status: TaskStatus,
        new_status: TaskStatus,
        reason: Option<&str>,
        rounds_completed: Option<u32>,
        set_cancel_requested: Option<bool>,
    ) -> Result<Option<Task>, StorageError> {
        let mut guard = self.inner.lock();
        let now = self.clock.now();
        let task = guard
            .tasks
            .get_mut(id.as_str())
            .ok_or_else(|| StorageError::NotFound(id.as_str().to_string()))?;
        if task.status != expected_status {
            return Ok(None);
        }
        task.status = new_status;
        if let Some(r) = reason {
            task.last_gate_reason = Some(r.to_string());
        }
        if let Some(rc) = rounds_completed {
            task.rounds_completed = rc;
        }
        if let Some(cancel) = set_cancel_requested {
            task.cancel_requested = cancel;
        }
        task.updated_at = now;
        Ok(Some(task.clone()))
    }

    fn set_cancel_requested(&self, id: &TaskId, requested: bool) -> Result<(), StorageError> {
        let mut guard = self.inner.lock();
        let task = guard
            .tasks
            .get_mut(id.as_str())
            .ok_or_else(|| StorageError::NotFound(id.as_str().to_string()))?;
        if task.status.is_terminal() {
            return Ok(());
        }
        task.cancel_requested = requested;
        Ok(())
    }

    fn is_cancel_requested(&self, id: &TaskId) -> Result<bool, StorageError> {
        let guard = self.inner.lock();
        let task = guard
            .tasks
            .get(id.as_str())
            .ok_or_else(|| StorageError::NotFound(id.as_str().to_string()))?;
        Ok(task.cancel_requested)
    }

    fn append_event(
        &self,
        id: &TaskId,
        kind: TaskEventKind,
        round: Option<u32>,
    ) -> Result<TaskEvent, StorageError> {
        let mut guard = self.inner.lock();
        if !guard.tasks.contains_key(id.as_str()) {
            return Err(StorageError::NotFound(id.as_str().to_string()));
        }
        let key = id.as_str().to_string();
        let seq = {
            let counter = guard.next_seq.entry(key.clone()).or_insert(0);
            *counter += 1;
            *counter
        };
        let event = TaskEvent {
            task_id: id.clone(),
            seq,
            kind,
            round,
            created_at: self.clock.now(),
        };
        guard.events.entry(key).or_default().push(event.clone());
        Ok(event)
    }

    fn list_events(&self, id: &TaskId) -> Result<Vec<TaskEvent>, StorageError> {
        let guard = self.inner.lock();
        Ok(guard
            .events
            .get(id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    fn delete_tasks(&self, ids: &[TaskId]) -> Result<(), StorageError> {
        let mut guard = self.inner.lock();
        for id in ids {
            guard.tasks.remove(id.as_str());
            guard.events.remove(id.as_str());
            guard.next_seq.remove(id.as_str());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
