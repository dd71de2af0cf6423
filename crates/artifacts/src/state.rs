// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `state.json` snapshot: the subset of a task's fields the store
//! mirrors to disk on every status change, independent of the
//! repository's own persistence.

use agentcheck_core::{RepairMode, Task, TaskStatus, WorkspaceFingerprint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point-in-time mirror of a [`Task`], written to `state.json` on
/// creation and after every status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStateSnapshot {
    pub task_id: String,
    pub status: TaskStatus,
    pub rounds_completed: u32,
    pub cancel_requested: bool,
    pub conversation_language: String,
    pub provider_models: BTreeMap<String, String>,
    pub provider_model_params: BTreeMap<String, String>,
    pub participant_models: BTreeMap<String, String>,
    pub participant_model_params: BTreeMap<String, String>,
    pub claude_team_agents: bool,
    pub codex_multi_agents: bool,
    pub claude_team_agents_overrides: BTreeMap<String, bool>,
    pub codex_multi_agents_overrides: BTreeMap<String, bool>,
    pub repair_mode: RepairMode,
    pub plain_mode: bool,
    pub stream_mode: bool,
    pub debate_mode: bool,
    pub sandbox_mode: bool,
    pub sandbox_generated: bool,
    pub sandbox_cleanup_on_pass: bool,
    pub self_loop_mode: bool,
    pub project_path: String,
    pub auto_merge: bool,
    pub merge_target_path: Option<String>,
    pub workspace_fingerprint: Option<WorkspaceFingerprint>,
    pub last_gate_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TaskStateSnapshot {
    /// Project a full [`Task`] down to the fields the artifact store
    /// mirrors on disk.
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.task_id.as_str().to_string(),
            status: task.status,
            rounds_completed: task.rounds_completed,
            cancel_requested: task.cancel_requested,
            conversation_language: task.conversation_language.clone(),
            provider_models: task.provider_models.clone(),
            provider_model_params: task.provider_model_params.clone(),
            participant_models: task.participant_models.clone(),
            participant_model_params: task.participant_model_params.clone(),
            claude_team_agents: task.claude_team_agents,
            codex_multi_agents: task.codex_multi_agents,
            claude_team_agents_overrides: task.claude_team_agents_overrides.clone(),
            codex_multi_agents_overrides: task.codex_multi_agents_overrides.clone(),
            repair_mode: task.repair_mode,
            plain_mode: task.plain_mode,
            stream_mode: task.stream_mode,
            debate_mode: task.debate_mode,
            sandbox_mode: task.sandbox_mode,
            sandbox_generated: task.sandbox_generated,
            sandbox_cleanup_on_pass: task.sandbox_cleanup_on_pass,
            self_loop_mode: task.self_loop_mode,
            project_path: task.project_path.display().to_string(),
            auto_merge: task.auto_merge,
            merge_target_path: task
                .merge_target_path
                .as_ref()
                .map(|p| p.display().to_string()),
            workspace_fingerprint: task.workspace_fingerprint.clone(),
            last_gate_reason: task.last_gate_reason.clone(),
            updated_at: task.updated_at,
        }
    }
}
