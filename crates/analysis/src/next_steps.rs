// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status-dependent next-step suggestions for external presentation.

use crate::disputes::Dispute;
use agentcheck_core::TaskStatus;

/// Suggest what an operator should do next, given a task's terminal (or
/// in-flight) status, its last gate reason, and its disputes.
pub fn derive_next_steps(status: TaskStatus, reason: Option<&str>, disputes: &[Dispute]) -> Vec<String> {
    let reason = reason.unwrap_or_default().trim();
    match status {
        TaskStatus::WaitingManual => {
            if reason.starts_with("proposal_consensus_stalled") {
                vec!["Proposal discussion stalled. Use Custom Reply + Re-run to provide specific direction, then continue.".to_string()]
            } else {
                vec!["Approve + Start to continue, or Reject to cancel this proposal.".to_string()]
            }
        }
        TaskStatus::Running => {
            vec!["Task is still executing. Watch latest stage events or worker logs for progress.".to_string()]
        }
        TaskStatus::Queued => {
            vec!["Start the task when ready, or keep it queued for scheduling.".to_string()]
        }
        TaskStatus::Passed => {
            vec!["Task passed. Optionally launch a follow-up evolution task for additional improvements.".to_string()]
        }
        TaskStatus::FailedGate => {
            if !disputes.is_empty() {
                vec!["Address blocker/unknown review points, then rerun the task.".to_string()]
            } else if reason.is_empty() {
                vec!["Address gate failures, then rerun.".to_string()]
            } else {
                vec![format!("Address gate failure reason: {reason}")]
            }
        }
        TaskStatus::FailedSystem => {
            if reason.is_empty() {
                vec!["Fix system/runtime issue, then rerun.".to_string()]
            } else {
                vec![format!("Fix system issue: {reason}")]
            }
        }
        TaskStatus::Canceled => {
            vec!["Task was canceled. Recreate or restart only if requirements still apply.".to_string()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stalled_proposal_gets_custom_reply_advice() {
        let steps = derive_next_steps(
            TaskStatus::WaitingManual,
            Some("proposal_consensus_stalled: across_rounds"),
            &[],
        );
        assert!(steps[0].contains("Custom Reply"));
    }

    #[test]
    fn plain_waiting_manual_asks_for_approval() {
        let steps = derive_next_steps(TaskStatus::WaitingManual, None, &[]);
        assert!(steps[0].contains("Approve + Start"));
    }

    #[test]
    fn failed_gate_with_disputes_points_at_review() {
        let dispute = Dispute {
            participant: "codex#reviewer-1".to_string(),
            verdict: "blocker".to_string(),
            note: "nope".to_string(),
        };
        let steps = derive_next_steps(TaskStatus::FailedGate, Some("review_blocker"), &[dispute]);
        assert!(steps[0].contains("blocker/unknown"));
    }

    #[test]
    fn failed_gate_without_disputes_echoes_reason() {
        let steps = derive_next_steps(TaskStatus::FailedGate, Some("tests_failed"), &[]);
        assert_eq!(steps[0], "Address gate failure reason: tests_failed");
    }

    #[test]
    fn passed_suggests_a_followup() {
        let steps = derive_next_steps(TaskStatus::Passed, None, &[]);
        assert!(steps[0].contains("passed"));
    }
}
