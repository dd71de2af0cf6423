// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reviewer drift analytics: how far each reviewer's blocker/unknown
//! rate strays from the global average, plus a failure-taxonomy trend
//! by day, over a recent window of tasks.

use crate::error::AnalysisError;
use agentcheck_core::{ReviewVerdict, TaskEventKind, TaskStatus};
use agentcheck_storage::TaskRepository;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bucket a `last_gate_reason` string into a coarse failure class,
/// matching the closed vocabulary the engine writes.
fn reason_bucket(reason: Option<&str>) -> Option<&'static str> {
    let reason = reason?.trim();
    if reason.is_empty() {
        return None;
    }
    let lower = reason.to_lowercase();
    for (needle, bucket) in [
        ("tests_failed", "tests_failed"),
        ("lint_failed", "lint_failed"),
        ("review_blocker", "review_blocker"),
        ("review_unknown", "review_unknown"),
        ("review_missing", "review_missing"),
        ("provider_limit", "provider_limit"),
        ("command_not_found", "command_not_found"),
        ("command_timeout", "command_timeout"),
        ("command_not_configured", "command_not_configured"),
        ("command_failed", "command_failed"),
        ("watchdog_timeout", "watchdog_timeout"),
        ("concurrency_limit", "concurrency_limit"),
    ] {
        if lower.contains(needle) {
            return Some(bucket);
        }
    }
    Some("other")
}

fn task_day(timestamp: chrono::DateTime<chrono::Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

/// One day's failure-taxonomy breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendDay {
    pub day: String,
    pub total: usize,
    pub buckets: BTreeMap<String, usize>,
}

/// One failure bucket's share of all `failed_gate` tasks in the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureTaxonomyEntry {
    pub bucket: String,
    pub count: usize,
    pub share: f64,
}

/// One reviewer's verdict distribution and drift from the global
/// adverse rate (share of blocker + unknown verdicts).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerDriftRow {
    pub participant: String,
    pub reviews: usize,
    pub no_blocker_rate: f64,
    pub blocker_rate: f64,
    pub unknown_rate: f64,
    pub adverse_rate: f64,
    pub drift_score: f64,
}

/// The full reviewer-drift / failure-taxonomy report over a window of
/// tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewerDriftReport {
    pub window_tasks: usize,
    pub window_failed_gate: usize,
    pub failure_taxonomy: Vec<FailureTaxonomyEntry>,
    pub failure_taxonomy_trend: Vec<TrendDay>,
    pub reviewer_drift: Vec<ReviewerDriftRow>,
}

/// Compute the drift report over the most recent `limit` tasks (clamped
/// to `[1, 2000]`).
pub fn compute_reviewer_drift(
    repository: &dyn TaskRepository,
    limit: usize,
) -> Result<ReviewerDriftReport, AnalysisError> {
    let limit = limit.clamp(1, 2000);
    let rows = repository.list_tasks(limit)?;

    let mut failure_taxonomy: BTreeMap<String, usize> = BTreeMap::new();
    let mut trend_by_day: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    let failures: Vec<_> = rows.iter().filter(|t| t.status == TaskStatus::FailedGate).collect();
    for row in &failures {
        let bucket = reason_bucket(row.last_gate_reason.as_deref()).unwrap_or("other");
        *failure_taxonomy.entry(bucket.to_string()).or_insert(0) += 1;
        let day = task_day(row.updated_at);
        *trend_by_day.entry(day).or_default().entry(bucket.to_string()).or_insert(0) += 1;
    }
    let total_failures = failures.len();

    let mut taxonomy_rows: Vec<FailureTaxonomyEntry> = failure_taxonomy
        .into_iter()
        .map(|(bucket, count)| FailureTaxonomyEntry {
            bucket,
            count,
            share: if total_failures > 0 {
                count as f64 / total_failures as f64
            } else {
                0.0
            },
        })
        .collect();
    taxonomy_rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.bucket.cmp(&b.bucket)));

    let mut trend_rows: Vec<TrendDay> = trend_by_day
        .into_iter()
        .map(|(day, buckets)| TrendDay {
            total: buckets.values().sum(),
            day,
            buckets,
        })
        .collect();
    trend_rows.sort_by(|a, b| a.day.cmp(&b.day));

    let mut reviewer_counts: BTreeMap<String, BTreeMap<&'static str, usize>> = BTreeMap::new();
    let mut global_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for row in &rows {
        let events = repository.list_events(&row.task_id)?;
        for event in &events {
            let (participant, verdict) = match &event.kind {
                TaskEventKind::Review { participant, verdict, .. }
                | TaskEventKind::ProposalReview { participant, verdict, .. }
                | TaskEventKind::DebateReview { participant, verdict, .. } => (participant, *verdict),
                _ => continue,
            };
            let bucket = match verdict {
                ReviewVerdict::NoBlocker => "no_blocker",
                ReviewVerdict::Blocker => "blocker",
                ReviewVerdict::Unknown => "unknown",
            };
            *reviewer_counts
                .entry(participant.clone())
                .or_default()
                .entry(bucket)
                .or_insert(0) += 1;
            *global_counts.entry(bucket).or_insert(0) += 1;
        }
    }

    let global_total: usize = global_counts.values().sum();
    let global_adverse_rate = if global_total > 0 {
        (global_counts.get("blocker").copied().unwrap_or(0) + global_counts.get("unknown").copied().unwrap_or(0))
            as f64
            / global_total as f64
    } else {
        0.0
    };

    let mut reviewer_rows: Vec<ReviewerDriftRow> = reviewer_counts
        .into_iter()
        .filter_map(|(participant, counts)| {
            let total: usize = counts.values().sum();
            if total == 0 {
                return None;
            }
            let no_blocker_rate = counts.get("no_blocker").copied().unwrap_or(0) as f64 / total as f64;
            let blocker_rate = counts.get("blocker").copied().unwrap_or(0) as f64 / total as f64;
            let unknown_rate = counts.get("unknown").copied().unwrap_or(0) as f64 / total as f64;
            let adverse_rate = blocker_rate + unknown_rate;
            Some(ReviewerDriftRow {
                participant,
                reviews: total,
                no_blocker_rate,
                blocker_rate,
                unknown_rate,
                adverse_rate,
                drift_score: (adverse_rate - global_adverse_rate).abs(),
            })
        })
        .collect();
    reviewer_rows.sort_by(|a, b| {
        b.drift_score
            .partial_cmp(&a.drift_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.reviews.cmp(&a.reviews))
            .then_with(|| a.participant.cmp(&b.participant))
    });

    Ok(ReviewerDriftReport {
        window_tasks: rows.len(),
        window_failed_gate: total_failures,
        failure_taxonomy: taxonomy_rows,
        failure_taxonomy_trend: trend_rows,
        reviewer_drift: reviewer_rows,
    })
}

#[cfg(test)]
#[path = "drift_tests.rs"]
mod tests;
