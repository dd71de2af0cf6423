// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strategy-hint injection: when a round fails its gate but the task
//! still has rounds left, the next round's author prompt should not be
//! a bare repeat of the original description. Folding in the failure
//! reason and a clipped reviewer note keeps the retry focused.

use agentcheck_core::clip_text;

const REVIEWER_NOTE_CLIP_CHARS: usize = 400;

/// Build the hint appended to the next round's author prompt.
pub fn build_strategy_hint(gate_reason: &str, reviewer_note: Option<&str>) -> String {
    let mut hint = format!(
        "Previous round failed the gate with reason: {gate_reason}. Address this before resubmitting."
    );
    if let Some(note) = reviewer_note {
        let trimmed = note.trim();
        if !trimmed.is_empty() {
            hint.push_str("\n\nReviewer note from the previous round:\n");
            hint.push_str(&clip_text(trimmed, REVIEWER_NOTE_CLIP_CHARS));
        }
    }
    hint
}

/// Append a strategy hint to a task's base description for the next
/// round's author prompt.
pub fn apply_strategy_hint(base_description: &str, hint: &str) -> String {
    format!("{base_description}\n\n---\n{hint}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_includes_gate_reason() {
        let hint = build_strategy_hint("tests_failed", None);
        assert!(hint.contains("tests_failed"));
    }

    #[test]
    fn hint_includes_clipped_reviewer_note() {
        let hint = build_strategy_hint("review_blocker", Some("the auth check is missing"));
        assert!(hint.contains("the auth check is missing"));
    }

    #[test]
    fn blank_reviewer_note_is_omitted() {
        let hint = build_strategy_hint("lint_failed", Some("   "));
        assert!(!hint.contains("Reviewer note"));
    }

    #[test]
    fn apply_hint_appends_after_description() {
        let result = apply_strategy_hint("fix the bug", "retry with tests passing");
        assert!(result.starts_with("fix the bug"));
        assert!(result.ends_with("retry with tests passing"));
    }
}
