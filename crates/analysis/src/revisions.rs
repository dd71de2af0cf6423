// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Revisions: the auto-fusion summary for a task, read from the
//! `auto_merge_summary` artifact or, failing that, the most recent
//! `auto_merge_completed` event.

use agentcheck_artifacts::ArtifactStore;
use agentcheck_core::{TaskEvent, TaskEventKind};
use serde::{Deserialize, Serialize};

/// The auto-fusion outcome for one task, or a bare `auto_merge: false`
/// when the task never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionsSummary {
    pub auto_merge: bool,
    pub mode: Option<String>,
    pub changed_files: usize,
    pub deleted_files: usize,
    pub snapshot_path: Option<String>,
    pub changelog_path: Option<String>,
    pub merged_at: Option<String>,
}

impl RevisionsSummary {
    fn none() -> Self {
        Self {
            auto_merge: false,
            mode: None,
            changed_files: 0,
            deleted_files: 0,
            snapshot_path: None,
            changelog_path: None,
            merged_at: None,
        }
    }
}

/// Read `artifacts/auto_merge_summary.json`, if present; else scan
/// `events` in reverse for the most recent `auto_merge_completed`; else
/// report no merge happened.
pub fn extract_revisions(artifacts: &ArtifactStore, task_id: &str, events: &[TaskEvent]) -> RevisionsSummary {
    if let Ok(Some(value)) = artifacts.read_artifact(task_id, "auto_merge_summary") {
        if let Ok(summary) = serde_json::from_value::<StoredSummary>(value) {
            return summary.into();
        }
    }

    for event in events.iter().rev() {
        if let TaskEventKind::AutoMergeCompleted {
            mode,
            changed_files,
            deleted_files,
            snapshot_path,
            changelog_path,
        } = &event.kind
        {
            return RevisionsSummary {
                auto_merge: true,
                mode: Some(mode.clone()),
                changed_files: changed_files.len(),
                deleted_files: deleted_files.len(),
                snapshot_path: snapshot_path.clone(),
                changelog_path: changelog_path.clone(),
                merged_at: Some(event.created_at.to_rfc3339()),
            };
        }
    }

    RevisionsSummary::none()
}

/// The shape of `artifacts/auto_merge_summary.json`, as written by the
/// engine's fusion step alongside the `auto_merge_completed` event.
#[derive(Debug, Deserialize)]
struct StoredSummary {
    mode: Option<String>,
    #[serde(default)]
    changed_files: Vec<String>,
    #[serde(default)]
    deleted_files: Vec<String>,
    snapshot_path: Option<String>,
    changelog_path: Option<String>,
    merged_at: Option<String>,
}

impl From<StoredSummary> for RevisionsSummary {
    fn from(s: StoredSummary) -> Self {
        Self {
            auto_merge: true,
            mode: s.mode,
            changed_files: s.changed_files.len(),
            deleted_files: s.deleted_files.len(),
            snapshot_path: s.snapshot_path,
            changelog_path: s.changelog_path,
            merged_at: s.merged_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcheck_core::TaskId;
    use chrono::Utc;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn no_merge_reports_auto_merge_false() {
        let dir = TempDir::new().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        let summary = extract_revisions(&store, "task-1", &[]);
        assert!(!summary.auto_merge);
    }

    #[test]
    fn reads_the_auto_merge_summary_artifact() {
        let dir = TempDir::new().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        store
            .write_artifact(
                "task-1",
                "auto_merge_summary",
                &json!({
                    "mode": "cross_repo",
                    "changed_files": ["a.txt", "b.txt"],
                    "deleted_files": [],
                    "snapshot_path": "/snap.zip",
                    "changelog_path": "/changelog.md",
                    "merged_at": "2026-01-01T00:00:00Z",
                }),
            )
            .expect("writes");
        let summary = extract_revisions(&store, "task-1", &[]);
        assert!(summary.auto_merge);
        assert_eq!(summary.mode.as_deref(), Some("cross_repo"));
        assert_eq!(summary.changed_files, 2);
    }

    #[test]
    fn falls_back_to_the_event_log() {
        let dir = TempDir::new().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        let events = vec![TaskEvent {
            task_id: TaskId::from("task-1"),
            seq: 1,
            kind: TaskEventKind::AutoMergeCompleted {
                mode: "in_place".to_string(),
                changed_files: vec!["a.txt".to_string()],
                deleted_files: vec![],
                snapshot_path: None,
                changelog_path: None,
            },
            round: Some(1),
            created_at: Utc::now(),
        }];
        let summary = extract_revisions(&store, "task-1", &events);
        assert!(summary.auto_merge);
        assert_eq!(summary.changed_files, 1);
    }
}
