// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Disputes: the reviewer blockers/unknowns and gate failures worth
//! surfacing for a task, plus any stalled-consensus episode.

use crate::findings::clip_snippet;
use agentcheck_core::{ReviewVerdict, TaskEvent, TaskEventKind};
use serde::{Deserialize, Serialize};

const MAX_DISPUTES: usize = 5;

/// One point of disagreement surfaced for a task: a reviewer verdict or
/// a gate failure, or a consensus stall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    pub participant: String,
    pub verdict: String,
    pub note: String,
}

fn verdict_str(verdict: ReviewVerdict) -> &'static str {
    match verdict {
        ReviewVerdict::NoBlocker => "no_blocker",
        ReviewVerdict::Blocker => "blocker",
        ReviewVerdict::Unknown => "unknown",
    }
}

/// Up to 5 disputes: `review`/`proposal_review` events with a
/// BLOCKER/UNKNOWN verdict, `gate_failed` events, and any
/// `proposal_consensus_stalled` episode (stall kind, round, attempt,
/// retry limit, verdict counts).
pub fn extract_disputes(events: &[TaskEvent]) -> Vec<Dispute> {
    let mut disputes = Vec::new();

    for event in events {
        if disputes.len() >= MAX_DISPUTES {
            break;
        }
        match &event.kind {
            TaskEventKind::Review {
                participant,
                verdict,
                output,
            }
            | TaskEventKind::ProposalReview {
                participant,
                verdict,
                output,
            } => {
                if !matches!(verdict, ReviewVerdict::Blocker | ReviewVerdict::Unknown) {
                    continue;
                }
                let note = {
                    let clipped = clip_snippet(output);
                    if clipped.is_empty() {
                        "review raised concerns".to_string()
                    } else {
                        clipped
                    }
                };
                disputes.push(Dispute {
                    participant: participant.clone(),
                    verdict: verdict_str(*verdict).to_string(),
                    note,
                });
            }
            TaskEventKind::GateFailed { reason } => {
                if reason.trim().is_empty() {
                    continue;
                }
                disputes.push(Dispute {
                    participant: "system".to_string(),
                    verdict: "gate_failed".to_string(),
                    note: clip_snippet(reason),
                });
            }
            TaskEventKind::ProposalConsensusStalled {
                stall_kind,
                attempt,
                retry_limit,
                verdict_counts,
            } => {
                let counts = verdict_counts
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                disputes.push(Dispute {
                    participant: "system".to_string(),
                    verdict: "proposal_consensus_stalled".to_string(),
                    note: format!(
                        "{stall_kind:?} stall at round {:?}, attempt {attempt}/{retry_limit} ({counts})",
                        event.round
                    ),
                });
            }
            _ => {}
        }
    }

    disputes
}
