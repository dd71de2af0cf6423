// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared across the workspace's crates. Gated behind the
//! `test-support` feature so production builds never link it.

use crate::task::{RepairMode, Task, TaskId, TaskStatus, WorkspaceFingerprint};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A minimally-valid task: `queued`, one reviewer, dry-run-friendly
/// author/reviewer ids, `max_rounds=1`, no sandbox.
pub fn sample_task(id: &str) -> Task {
    let now = Utc::now();
    Task {
        task_id: TaskId::new(id),
        title: "sample task".to_string(),
        description: "exercise the workflow end to end".to_string(),
        status: TaskStatus::Queued,
        author_participant: "claude#author".to_string(),
        reviewer_participants: vec!["codex#reviewer-1".to_string()],
        project_path: PathBuf::from("/tmp/sample-project"),
        workspace_path: PathBuf::from("/tmp/sample-project"),
        sandbox_workspace_path: None,
        workspace_fingerprint: Some(WorkspaceFingerprint::default()),
        test_command: Some("true".to_string()),
        lint_command: Some("true".to_string()),
        max_rounds: 1,
        self_loop_mode: false,
        auto_merge: false,
        merge_target_path: None,
        repair_mode: RepairMode::Balanced,
        debate_mode: false,
        plain_mode: true,
        stream_mode: false,
        sandbox_mode: false,
        sandbox_generated: false,
        sandbox_cleanup_on_pass: false,
        evolution_level: 0,
        evolve_until: None,
        conversation_language: "en".to_string(),
        provider_models: BTreeMap::new(),
        provider_model_params: BTreeMap::new(),
        participant_models: BTreeMap::new(),
        participant_model_params: BTreeMap::new(),
        claude_team_agents: false,
        codex_multi_agents: false,
        claude_team_agents_overrides: BTreeMap::new(),
        codex_multi_agents_overrides: BTreeMap::new(),
        rounds_completed: 0,
        cancel_requested: false,
        last_gate_reason: None,
        created_at: now,
        updated_at: now,
    }
}
