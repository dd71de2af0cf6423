// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Renders a task's history as one markdown block suitable for pasting
//! into a pull request description.

use crate::error::AnalysisError;
use crate::history::{build_task_history, TaskHistory};
use agentcheck_artifacts::ArtifactStore;
use agentcheck_core::TaskId;
use agentcheck_risk::{read_git_state, GitState};
use agentcheck_storage::TaskRepository;
use std::fmt::Write as _;
use std::path::Path;

/// A task's history rendered as a GitHub-flavored markdown summary,
/// plus the git state and artifact listing it was built from.
#[derive(Debug, Clone)]
pub struct PrSummary {
    pub task_id: String,
    pub project_path: String,
    pub git: GitState,
    pub markdown: String,
    pub artifacts: Vec<String>,
}

/// Build a [`PrSummary`] for `task_id`: the task's title, status, round
/// progress, and project path, its git branch/worktree state, its
/// analysed findings/revisions/disputes/next-steps, and the list of
/// artifact names under its thread directory.
pub fn build_github_pr_summary(
    repository: &dyn TaskRepository,
    artifacts: &ArtifactStore,
    task_id: &TaskId,
) -> Result<PrSummary, AnalysisError> {
    let task = repository
        .get_task(task_id)?
        .ok_or_else(|| AnalysisError::TaskNotFound(task_id.as_str().to_string()))?;
    let history: TaskHistory = build_task_history(repository, artifacts, task_id)?;
    let git = read_git_state(&task.project_path);
    let artifact_names = artifacts.list_artifact_names(task_id.as_str())?;

    let project_path = display_path(&task.project_path);
    let mut md = String::new();
    let _ = writeln!(md, "### AgentCheck Task Summary | {task_id}");
    let _ = writeln!(md);
    let _ = writeln!(md, "- Title: {}", task.title);
    let _ = writeln!(md, "- Status: {}", history.status);
    let _ = writeln!(
        md,
        "- Last reason: {}",
        task.last_gate_reason.as_deref().unwrap_or("n/a")
    );
    let _ = writeln!(md, "- Rounds: {}/{}", task.rounds_completed, task.max_rounds);
    let _ = writeln!(md, "- Project path: `{project_path}`");
    if git.is_repo {
        let _ = writeln!(
            md,
            "- Git branch: `{}`",
            git.branch.as_deref().unwrap_or("detached")
        );
        let _ = writeln!(md, "- Git worktree clean: `{}`", git.worktree_clean);
        if let Some(remote) = &git.remote_origin {
            let _ = writeln!(md, "- Git remote: `{remote}`");
        }
    }
    let _ = writeln!(md);
    let _ = writeln!(md, "#### Core Findings");
    write_bulleted(&mut md, &history.core_findings, 5);
    let _ = writeln!(md);
    let _ = writeln!(md, "#### Revisions");
    if history.revisions.auto_merge {
        let _ = writeln!(md, "- auto_merge: `true`");
        let _ = writeln!(
            md,
            "- mode: `{}`",
            history.revisions.mode.as_deref().unwrap_or("n/a")
        );
        let _ = writeln!(md, "- changed_files: `{}`", history.revisions.changed_files);
        let _ = writeln!(md, "- deleted_files: `{}`", history.revisions.deleted_files);
        if let Some(p) = &history.revisions.snapshot_path {
            let _ = writeln!(md, "- snapshot_path: `{p}`");
        }
        if let Some(p) = &history.revisions.changelog_path {
            let _ = writeln!(md, "- changelog_path: `{p}`");
        }
    } else {
        let _ = writeln!(md, "- n/a");
    }
    let _ = writeln!(md);
    let _ = writeln!(md, "#### Review Disputes");
    if history.disputes.is_empty() {
        let _ = writeln!(md, "- none");
    } else {
        for d in history.disputes.iter().take(5) {
            let _ = writeln!(md, "- {} | {}: {}", d.participant, d.verdict, d.note);
        }
    }
    let _ = writeln!(md);
    let _ = writeln!(md, "#### Next Steps");
    write_bulleted(&mut md, &history.next_steps, 5);
    let _ = writeln!(md);
    let _ = writeln!(md, "#### Task Artifacts");
    if artifact_names.is_empty() {
        let _ = writeln!(md, "- n/a");
    } else {
        for name in &artifact_names {
            let _ = writeln!(md, "- {name}");
        }
    }

    Ok(PrSummary {
        task_id: task_id.as_str().to_string(),
        project_path,
        git,
        markdown: md,
        artifacts: artifact_names,
    })
}

fn write_bulleted(md: &mut String, lines: &[String], max: usize) {
    if lines.is_empty() {
        let _ = writeln!(md, "- n/a");
        return;
    }
    for line in lines.iter().take(max) {
        let _ = writeln!(md, "- {line}");
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcheck_core::test_support::sample_task;
    use agentcheck_storage::InMemoryTaskRepository;
    use tempfile::TempDir;

    #[test]
    fn renders_a_summary_for_a_fresh_task() {
        let repo = InMemoryTaskRepository::new();
        let task = sample_task("task-1");
        repo.create_task(task.clone()).expect("creates");
        let dir = TempDir::new().expect("tempdir");
        let artifacts = ArtifactStore::new(dir.path());

        let summary = build_github_pr_summary(&repo, &artifacts, &task.task_id).expect("builds");
        assert!(summary.markdown.contains("AgentCheck Task Summary"));
        assert!(summary.markdown.contains("Status: queued"));
        assert!(!summary.git.is_repo);
    }

    #[test]
    fn missing_task_is_an_error() {
        let repo = InMemoryTaskRepository::new();
        let dir = TempDir::new().expect("tempdir");
        let artifacts = ArtifactStore::new(dir.path());
        let result = build_github_pr_summary(&repo, &artifacts, &TaskId::from("missing"));
        assert!(result.is_err());
    }
}
