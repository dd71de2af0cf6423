// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-task statistics: status counts, active-task count, and
//! recent-terminal-task pass/fail rates and mean duration.

use crate::error::AnalysisError;
use agentcheck_core::TaskStatus;
use agentcheck_storage::TaskRepository;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const RECENT_WINDOW: usize = 50;

/// Aggregate counters over every task this repository knows about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskStats {
    pub total_tasks: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub active_tasks: usize,
    pub recent_terminal_total: usize,
    pub pass_rate_50: f64,
    pub failed_gate_rate_50: f64,
    pub failed_system_rate_50: f64,
    pub mean_task_duration_seconds_50: f64,
}

/// Compute [`TaskStats`] over every task in `repository` (capped at
/// 10,000 rows), using the most recent 50 for rate/duration figures.
pub fn compute_task_stats(repository: &dyn TaskRepository) -> Result<TaskStats, AnalysisError> {
    let rows = repository.list_tasks(10_000)?;

    let mut status_counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in &rows {
        *status_counts.entry(row.status.to_string()).or_insert(0) += 1;
    }
    let active_tasks = status_counts.get("running").copied().unwrap_or(0)
        + status_counts.get("queued").copied().unwrap_or(0);

    let recent: Vec<_> = rows.iter().take(RECENT_WINDOW).collect();
    let recent_terminal: Vec<_> = recent.iter().filter(|t| t.status.is_terminal_or_gated()).collect();
    let recent_terminal_total = recent_terminal.len();

    let (pass_rate_50, failed_gate_rate_50, failed_system_rate_50) = if recent_terminal_total > 0 {
        let passed = recent_terminal
            .iter()
            .filter(|t| t.status == TaskStatus::Passed)
            .count();
        let failed_gate = recent_terminal
            .iter()
            .filter(|t| t.status == TaskStatus::FailedGate)
            .count();
        let failed_system = recent_terminal
            .iter()
            .filter(|t| t.status == TaskStatus::FailedSystem)
            .count();
        (
            passed as f64 / recent_terminal_total as f64,
            failed_gate as f64 / recent_terminal_total as f64,
            failed_system as f64 / recent_terminal_total as f64,
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    let durations: Vec<f64> = recent_terminal
        .iter()
        .filter_map(|t| {
            let delta = (t.updated_at - t.created_at).num_milliseconds() as f64 / 1000.0;
            (delta >= 0.0).then_some(delta)
        })
        .collect();
    let mean_task_duration_seconds_50 = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<f64>() / durations.len() as f64
    };

    Ok(TaskStats {
        total_tasks: rows.len(),
        status_counts,
        active_tasks,
        recent_terminal_total,
        pass_rate_50,
        failed_gate_rate_50,
        failed_system_rate_50,
        mean_task_duration_seconds_50,
    })
}

trait TerminalOrGated {
    fn is_terminal_or_gated(&self) -> bool;
}

impl TerminalOrGated for TaskStatus {
    /// The four terminal statuses that recent-window rate and duration
    /// figures are drawn from.
    fn is_terminal_or_gated(&self) -> bool {
        matches!(
            self,
            TaskStatus::Passed | TaskStatus::FailedGate | TaskStatus::FailedSystem | TaskStatus::Canceled
        )
    }
}
