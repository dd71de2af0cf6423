// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed task repository. Tasks and events are stored as
//! serialized JSON blobs alongside a handful of indexed columns used for
//! CAS and ordering, with a materialized-state approach fronted by SQL
//! transactions instead of a JSONL WAL.

use crate::error::StorageError;
use crate::repository::TaskRepository;
use agentcheck_core::{Task, TaskEvent, TaskEventKind, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

const BUSY_RETRY_ATTEMPTS: u32 = 8;
const BUSY_RETRY_BASE_MS: u64 = 5;
const BUSY_RETRY_CAP_MS: u64 = 200;

pub struct SqliteTaskRepository {
    conn: Mutex<Connection>,
}

impl SqliteTaskRepository {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn configure(conn: &Connection) -> Result<(), StorageError> {
        conn.execute_batch(
            "PRAGMA busy_timeout = 30000;
             PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;",
        )?;
        Ok(())
    }

    fn migrate(conn: &Connection) -> Result<(), StorageError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                task_id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS events (
                task_id TEXT NOT NULL REFERENCES tasks(task_id) ON DELETE CASCADE,
                seq INTEGER NOT NULL,
                data TEXT NOT NULL,
                round INTEGER,
                created_at TEXT NOT NULL,
                PRIMARY KEY (task_id, seq)
            );
            CREATE TABLE IF NOT EXISTS seq_counters (
                task_id TEXT PRIMARY KEY REFERENCES tasks(task_id) ON DELETE CASCADE,
                next_seq INTEGER NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Run `f` inside an immediate transaction, retrying with bounded
    /// exponential backoff on `SQLITE_BUSY`.
    fn with_retry<T>(
        &self,
        f: impl Fn(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StorageError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut delay_ms = BUSY_RETRY_BASE_MS;
        for attempt in 0..BUSY_RETRY_ATTEMPTS {
            match f(&conn) {
                Ok(value) => return Ok(value),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::DatabaseBusy
                        && attempt + 1 < BUSY_RETRY_ATTEMPTS =>
                {
                    thread::sleep(Duration::from_millis(delay_ms));
                    delay_ms = (delay_ms * 2).min(BUSY_RETRY_CAP_MS);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StorageError::Busy)
    }

    fn row_to_task(data: &str) -> Result<Task, StorageError> {
        Ok(serde_json::from_str(data)?)
    }
}

fn rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl TaskRepository for SqliteTaskRepository {
    fn create_task(&self, task: Task) -> Result<(), StorageError> {
        let data = serde_json::to_string(&task)?;
        self.with_retry(|conn| {
            conn.execute(
                "INSERT INTO tasks (task_id, status, data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    task.task_id.as_str(),
                    task.status.to_string(),
                    data,
                    rfc3339(&task.created_at),
                    rfc3339(&task.updated_at),
                ],
            )
        })?;
        Ok(())
    }

    fn get_task(&self, id: &TaskId) -> Result<Option<Task>, StorageError> {
        let data: Option<String> = self.with_retry(|conn| {
            conn.query_row(
                "SELECT data FROM tasks WHERE task_id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
        })?;
        data.map(|d| Self::row_to_task(&d)).transpose()
    }

    fn list_tasks(&self, limit: usize) -> Result<Vec<Task>, StorageError> {
        let limit = limit as i64;
        let rows: Vec<String> = self.with_retry(|conn| {
            let mut stmt = conn.prepare(
                "SELECT data FROM tasks ORDER BY created_at DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(params![limit], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(rows)
        })?;
        rows.iter().map(|d| Self::row_to_task(d)).collect()
    }

    fn update_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        reason: Option<&str>,
        rounds_completed: Option<u32>,
    ) -> Result<Task, StorageError> {
        self.with_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            let data: Option<String> = tx
                .query_row(
                    "SELECT data FROM tasks WHERE task_id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(data) = data else {
                return Ok(Err(StorageError::NotFound(id.as_str().to_string())));
            };
            let mut task: Task = match serde_json::from_str(&data) {
                Ok(t) => t,
                Err(e) => return Ok(Err(e.into())),
            };
            task.status = status;
            if let Some(r) = reason {
                task.last_gate_reason = Some(r.to_string());
            }
            if let Some(rc) = rounds_completed {
                task.rounds_completed = rc;
            }
            task.updated_at = Utc::now();
            let updated_data = match serde_json::to_string(&task) {
                Ok(d) => d,
                Err(e) => return Ok(Err(e.into())),
            };
            tx.execute(
                "UPDATE tasks SET status = ?2, data = ?3, updated_at = ?4 WHERE task_id = ?1",
                params![
                    id.as_str(),
                    task.status.to_string(),
                    updated_data,
                    rfc3339(&task.updated_at),
                ],
            )?;
            tx.commit()?;
            Ok(Ok(task))
        })?
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
        self.with_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            let data: Option<String> = tx
                .query_row(
                    "SELECT data FROM tasks WHERE task_id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(data) = data else {
                return Ok(Err(StorageError::NotFound(id.as_str().to_string())));
            };
            let mut task: Task = match serde_json::from_str(&data) {
                Ok(t) => t,
                Err(e) => return Ok(Err(e.into())),
            };
            if task.status != expected_status {
                return Ok(Ok(None));
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
            task.updated_at = Utc::now();
            let updated_data = match serde_json::to_string(&task) {
                Ok(d) => d,
                Err(e) => return Ok(Err(e.into())),
            };
            tx.execute(
                "UPDATE tasks SET status = ?2, data = ?3, updated_at = ?4 WHERE task_id = ?1",
                params![
                    id.as_str(),
                    task.status.to_string(),
                    updated_data,
                    rfc3339(&task.updated_at),
                ],
            )?;
            tx.commit()?;
            Ok(Ok(Some(task)))
        })?
    }

    fn set_cancel_requested(&self, id: &TaskId, requested: bool) -> Result<(), StorageError> {
        let task = self
            .get_task(id)?
            .ok_or_else(|| StorageError::NotFound(id.as_str().to_string()))?;
        if task.status.is_terminal() {
            return Ok(());
        }
        let mut updated = task;
        updated.cancel_requested = requested;
        let data = serde_json::to_string(&updated)?;
        self.with_retry(|conn| {
            conn.execute(
                "UPDATE tasks SET data = ?2 WHERE task_id = ?1",
                params![id.as_str(), data],
            )
        })?;
        Ok(())
    }

    fn is_cancel_requested(&self, id: &TaskId) -> Result<bool, StorageError> {
        let task = self
            .get_task(id)?
            .ok_or_else(|| StorageError::NotFound(id.as_str().to_string()))?;
        Ok(task.cancel_requested)
    }

    fn append_event(
        &self,
        id: &TaskId,
        kind: TaskEventKind,
        round: Option<u32>,
    ) -> Result<TaskEvent, StorageError> {
        let now = Utc::now();
        self.with_retry(|conn| {
            let tx = conn.unchecked_transaction()?;

            let exists: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM tasks WHERE task_id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Ok(Err(StorageError::NotFound(id.as_str().to_string())));
            }

            let updated = tx.execute(
                "UPDATE seq_counters SET next_seq = next_seq + 1 WHERE task_id = ?1",
                params![id.as_str()],
            )?;
            let seq: i64 = if updated == 0 {
                let max_seq: i64 = tx
                    .query_row(
                        "SELECT COALESCE(MAX(seq), 0) FROM events WHERE task_id = ?1",
                        params![id.as_str()],
                        |row| row.get(0),
                    )
                    .unwrap_or(0);
                let next = max_seq + 1;
                tx.execute(
                    "INSERT INTO seq_counters (task_id, next_seq) VALUES (?1, ?2)",
                    params![id.as_str(), next + 1],
                )?;
                next
            } else {
                tx.query_row(
                    "SELECT next_seq FROM seq_counters WHERE task_id = ?1",
                    params![id.as_str()],
                    |row| row.get::<_, i64>(0),
                )? - 1
            };

            let event = TaskEvent {
                task_id: id.clone(),
                seq: seq as u64,
                kind,
                round,
                created_at: now,
            };
            let data = match serde_json::to_string(&event.kind) {
                Ok(d) => d,
                Err(e) => return Ok(Err(e.into())),
            };
            tx.execute(
                "INSERT INTO events (task_id, seq, data, round, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id.as_str(), seq, data, round, rfc3339(&now)],
            )?;
            tx.commit()?;
            Ok(Ok(event))
        })?
    }

    fn list_events(&self, id: &TaskId) -> Result<Vec<TaskEvent>, StorageError> {
        let rows: Vec<(i64, String, Option<u32>, String)> = self.with_retry(|conn| {
            let mut stmt = conn.prepare(
                "SELECT seq, data, round, created_at FROM events WHERE task_id = ?1 ORDER BY seq ASC",
            )?;
            let rows = stmt
                .query_map(params![id.as_str()], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(seq, data, round, created_at)| {
                let kind: TaskEventKind = serde_json::from_str(&data)?;
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());
                Ok(TaskEvent {
                    task_id: id.clone(),
                    seq: seq as u64,
                    kind,
                    round,
                    created_at,
                })
            })
            .collect()
    }

    fn delete_tasks(&self, ids: &[TaskId]) -> Result<(), StorageError> {
        self.with_retry(|conn| {
            let tx = conn.unchecked_transaction()?;
            for id in ids {
                tx.execute("DELETE FROM events WHERE task_id = ?1", params![id.as_str()])?;
                tx.execute(
                    "DELETE FROM seq_counters WHERE task_id = ?1",
                    params![id.as_str()],
                )?;
                tx.execute("DELETE FROM tasks WHERE task_id = ?1", params![id.as_str()])?;
            }
            tx.commit()?;
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
