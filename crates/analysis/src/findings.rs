// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core findings: the two or three highlights worth surfacing about a
//! task, preferring hand-written markdown summaries over raw event
//! snippets.

use agentcheck_artifacts::ArtifactStore;
use agentcheck_core::{TaskEvent, TaskEventKind};

const MAX_FINDINGS: usize = 3;
const MAX_SNIPPET_CHARS: usize = 220;
const MAX_MARKDOWN_LINES: usize = 5;

/// One-line, whitespace-collapsed, ellipsis-clipped rendering of `value`.
/// Empty input yields an empty string rather than `"..."`.
pub fn clip_snippet(value: &str) -> String {
    let one_line = value.replace(['\r', '\n'], " ");
    let trimmed = one_line.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let char_count = trimmed.chars().count();
    if char_count <= MAX_SNIPPET_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(MAX_SNIPPET_CHARS).collect();
    format!("{}...", head.trim_end())
}

/// Up to the first 5 non-blank, non-heading lines of a markdown file,
/// clipped through [`clip_snippet`].
fn markdown_highlights(artifacts: &ArtifactStore, task_id: &str, file_name: &str) -> Vec<String> {
    let content = match artifacts.read_markdown(task_id, file_name) {
        Ok(Some(text)) => text,
        _ => return Vec::new(),
    };
    let mut lines = Vec::new();
    for raw in content.lines() {
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        lines.push(text.to_string());
        if lines.len() >= MAX_MARKDOWN_LINES {
            break;
        }
    }
    lines
        .into_iter()
        .map(|l| clip_snippet(&l))
        .filter(|l| !l.is_empty())
        .collect()
}

/// An event kind worth quoting in a findings summary, and the snippet
/// to quote: its output, or its reason, or its bare type name.
fn event_snippet(kind: &TaskEventKind) -> Option<String> {
    let snippet = match kind {
        TaskEventKind::Discussion { output, .. }
        | TaskEventKind::ProposalReview { output, .. }
        | TaskEventKind::Review { output, .. }
        | TaskEventKind::DebateReview { output, .. } => clip_snippet(output),
        TaskEventKind::DebateReply { output } => clip_snippet(output),
        TaskEventKind::GateFailed { reason } | TaskEventKind::GatePassed { reason } => {
            clip_snippet(reason)
        }
        TaskEventKind::ManualGate { note } => note.as_deref().map(clip_snippet).unwrap_or_default(),
        _ => return None,
    };
    if snippet.is_empty() {
        None
    } else {
        Some(snippet)
    }
}

/// Derive up to 3 core findings for a task: prefer `summary.md`, then
/// `final_report.md` highlights, then snippets from evidence-bearing
/// events, then a last-resort `"Final reason: {reason}"` line.
pub fn extract_core_findings(
    artifacts: &ArtifactStore,
    task_id: &str,
    events: &[TaskEvent],
    fallback_reason: Option<&str>,
) -> Vec<String> {
    let mut findings = Vec::new();

    for file_name in ["summary.md", "final_report.md"] {
        for line in markdown_highlights(artifacts, task_id, file_name) {
            if !findings.contains(&line) {
                findings.push(line);
            }
            if findings.len() >= MAX_FINDINGS {
                return findings;
            }
        }
    }

    for event in events {
        let Some(snippet) = event_snippet(&event.kind) else {
            continue;
        };
        if !findings.contains(&snippet) {
            findings.push(snippet);
        }
        if findings.len() >= MAX_FINDINGS {
            return findings;
        }
    }

    if findings.is_empty() {
        if let Some(reason) = fallback_reason {
            findings.push(format!("Final reason: {reason}"));
        }
    }

    findings
}
