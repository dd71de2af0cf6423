// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agentcheck-analysis: reads a task's event log and on-disk artifacts
//! and derives the core findings, revisions, disputes, and next-step
//! suggestions external presentation layers consume. Also home to the
//! cross-task analytics (reviewer drift, task statistics) and the
//! GitHub PR summary renderer, since both read the same event corpus
//! this crate already knows how to walk.

mod disputes;
mod drift;
mod error;
mod findings;
mod history;
mod next_steps;
mod pr_summary;
mod revisions;
mod stats;

pub use disputes::{extract_disputes, Dispute};
pub use drift::{compute_reviewer_drift, FailureTaxonomyEntry, ReviewerDriftReport, ReviewerDriftRow, TrendDay};
pub use error::AnalysisError;
pub use findings::{clip_snippet, extract_core_findings};
pub use history::{build_task_history, TaskHistory};
pub use next_steps::derive_next_steps;
pub use pr_summary::build_github_pr_summary;
pub use revisions::{extract_revisions, RevisionsSummary};
pub use stats::{compute_task_stats, TaskStats};
