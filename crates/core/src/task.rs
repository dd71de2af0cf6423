// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task record and its lifecycle state machine, plus the append-only
//! task event log.

use crate::participant::Participant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a task.
    #[derive(Default)]
    pub struct TaskId;
}

/// The task lifecycle status. `Passed` and `Canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    WaitingManual,
    Passed,
    FailedGate,
    FailedSystem,
    Canceled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Passed | TaskStatus::Canceled)
    }

    fn allowed_targets(&self) -> &'static [TaskStatus] {
        use TaskStatus::*;
        match self {
            Queued => &[Running, Canceled],
            Running => &[WaitingManual, Passed, FailedGate, FailedSystem, Canceled],
            WaitingManual => &[Running, Canceled],
            FailedGate => &[Running, Canceled],
            FailedSystem => &[Running, Canceled],
            Passed => &[],
            Canceled => &[],
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::WaitingManual => "waiting_manual",
            TaskStatus::Passed => "passed",
            TaskStatus::FailedGate => "failed_gate",
            TaskStatus::FailedSystem => "failed_system",
            TaskStatus::Canceled => "canceled",
        };
        write!(f, "{s}")
    }
}

/// Whether a transition from one status to another is allowed by the DAG
/// in the workflow engine's design.
pub fn can_transition(from: TaskStatus, to: TaskStatus) -> bool {
    from.allowed_targets().contains(&to)
}

/// A reviewer's verdict on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVerdict {
    NoBlocker,
    Blocker,
    Unknown,
}

impl std::fmt::Display for ReviewVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReviewVerdict::NoBlocker => "no_blocker",
            ReviewVerdict::Blocker => "blocker",
            ReviewVerdict::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Repair aggressiveness requested for retried rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairMode {
    Minimal,
    Balanced,
    Structural,
}

impl Default for RepairMode {
    fn default() -> Self {
        RepairMode::Balanced
    }
}

/// A compact summary of the roots a task touches, used to detect drift
/// between task creation and a later resume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceFingerprint {
    pub project_path: String,
    pub workspace_path: String,
    pub sandbox_workspace_path: Option<String>,
    pub merge_target_path: Option<String>,
    pub project_has_git: bool,
    /// Short SHA-1 signature (20 hex chars) over the sorted top-level
    /// listing of `project_path`, ignoring VCS/cache/secret entries.
    pub project_head_signature: String,
    /// Same signature, taken over `workspace_path`.
    pub workspace_head_signature: String,
}

/// A task: the unit of work the workflow engine drives to a terminal
/// status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,

    pub author_participant: String,
    pub reviewer_participants: Vec<String>,

    pub project_path: PathBuf,
    pub workspace_path: PathBuf,
    pub sandbox_workspace_path: Option<PathBuf>,
    pub workspace_fingerprint: Option<WorkspaceFingerprint>,

    pub test_command: Option<String>,
    pub lint_command: Option<String>,

    pub max_rounds: u32,
    pub self_loop_mode: bool,
    pub auto_merge: bool,
    pub merge_target_path: Option<PathBuf>,
    pub repair_mode: RepairMode,
    pub debate_mode: bool,
    pub plain_mode: bool,
    pub stream_mode: bool,
    pub sandbox_mode: bool,
    pub sandbox_generated: bool,
    pub sandbox_cleanup_on_pass: bool,
    pub evolution_level: u8,
    pub evolve_until: Option<DateTime<Utc>>,
    pub conversation_language: String,

    pub provider_models: BTreeMap<String, String>,
    pub provider_model_params: BTreeMap<String, String>,
    pub participant_models: BTreeMap<String, String>,
    pub participant_model_params: BTreeMap<String, String>,
    pub claude_team_agents: bool,
    pub codex_multi_agents: bool,
    pub claude_team_agents_overrides: BTreeMap<String, bool>,
    pub codex_multi_agents_overrides: BTreeMap<String, bool>,

    pub rounds_completed: u32,
    pub cancel_requested: bool,
    pub last_gate_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// All participants in the task's pool (author first, then reviewers),
    /// each parsed into a `Participant`.
    pub fn participants(&self) -> Result<Vec<Participant>, String> {
        let mut out = Vec::with_capacity(1 + self.reviewer_participants.len());
        out.push(crate::participant::parse_participant_id(
            &self.author_participant,
        )?);
        for r in &self.reviewer_participants {
            out.push(crate::participant::parse_participant_id(r)?);
        }
        Ok(out)
    }

    /// True if `sandbox_mode=false` implies `workspace_path == project_path`,
    /// the invariant the task repository must never violate.
    pub fn satisfies_workspace_invariant(&self) -> bool {
        self.sandbox_mode || self.workspace_path == self.project_path
    }

    pub fn is_within_round_budget(&self) -> bool {
        self.rounds_completed <= self.max_rounds
    }

    /// The lowercased, deduplicated set of participant ids referenced as
    /// reviewers (used by validation to check override-map keys).
    pub fn reviewer_alias_set(&self) -> HashSet<String> {
        self.reviewer_participants
            .iter()
            .filter_map(|r| crate::participant::parse_participant_id(r).ok())
            .map(|p| p.id.to_lowercase())
            .collect()
    }
}

/// One entry in a task's append-only event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvent {
    pub task_id: TaskId,
    pub seq: u64,
    #[serde(flatten)]
    pub kind: TaskEventKind,
    pub round: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// The closed vocabulary of event kinds, each carrying a structured
/// payload. Tagged on `type` so the on-disk JSONL form matches
/// `{"type": "...", ...fields}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEventKind {
    Discussion {
        participant: String,
        output: String,
    },
    ProposalReview {
        participant: String,
        verdict: ReviewVerdict,
        output: String,
    },
    ProposalDiscussionError {
        reason: String,
    },
    ProposalConsensusStalled {
        stall_kind: StallKind,
        attempt: u32,
        retry_limit: u32,
        verdict_counts: BTreeMap<String, u32>,
    },
    Review {
        participant: String,
        verdict: ReviewVerdict,
        output: String,
    },
    ReviewError {
        participant: String,
        reason: String,
    },
    DebateReview {
        participant: String,
        verdict: ReviewVerdict,
        output: String,
    },
    DebateReply {
        participant: String,
        output: String,
    },
    GatePassed {
        reason: String,
    },
    GateFailed {
        reason: String,
    },
    ManualGate {
        note: Option<String>,
    },
    AutoMergeCompleted {
        mode: String,
        changed_files: Vec<String>,
        deleted_files: Vec<String>,
        snapshot_path: Option<String>,
        changelog_path: Option<String>,
    },
    HistoryEvent {
        message: String,
    },
}

/// Whether reviewer consensus stalled within a single round or persisted
/// across several rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StallKind {
    InRound,
    AcrossRounds,
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
