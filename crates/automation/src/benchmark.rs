// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The A/B benchmark driver: runs a fixed task corpus under two policy
//! variants, aggregates terminal results, and renders a markdown report
//! comparing them.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// One task in the benchmark or regression corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkTask {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// The six built-in benchmark tasks, covering API validation,
/// task-state transitions, conversation UX, history traceability,
/// watchdog stability, and security guardrails.
pub fn default_benchmark_tasks() -> Vec<BenchmarkTask> {
    [
        (
            "api-validation-hardening",
            "Benchmark: API validation hardening",
            "Audit API input validation and fix one concrete reliability bug with tests.",
        ),
        (
            "task-state-transition",
            "Benchmark: task state transition reliability",
            "Inspect task start/cancel/status transitions and patch one race or stale-state issue.",
        ),
        (
            "conversation-ux-readability",
            "Benchmark: conversation readability quality",
            "Improve conversation clarity by reducing noisy output and preserving key evidence paths.",
        ),
        (
            "history-traceability",
            "Benchmark: project history traceability",
            "Check project history/event lineage and fix one missing or misleading trace record path.",
        ),
        (
            "watchdog-stability",
            "Benchmark: watchdog stability",
            "Audit watchdog timeout/stall logic and improve one reliability edge case.",
        ),
        (
            "security-guardrails",
            "Benchmark: security guardrails",
            "Review API/service guardrails for risky defaults and tighten one concrete exposure vector.",
        ),
    ]
    .into_iter()
    .map(|(id, title, description)| BenchmarkTask {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
    })
    .collect()
}

fn parse_task_list(raw: &str) -> Option<Vec<BenchmarkTask>> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let items = value.as_array()?;
    let mut out = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else { continue };
        let title = obj.get("title").and_then(|v| v.as_str()).unwrap_or("").trim();
        let description = obj
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        if title.is_empty() || description.is_empty() {
            continue;
        }
        let id = obj
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .unwrap_or_else(|| format!("task-{:02}", i + 1));
        out.push(BenchmarkTask {
            id,
            title: title.to_string(),
            description: description.to_string(),
        });
    }
    Some(out)
}

/// Load the benchmark corpus from a JSON file, falling back to the
/// built-in defaults if `path` is absent, unreadable, or unparseable,
/// or if every entry in it was filtered out.
pub fn load_benchmark_tasks(path: Option<&Path>) -> Vec<BenchmarkTask> {
    let Some(path) = path else {
        return default_benchmark_tasks();
    };
    if !path.exists() {
        return default_benchmark_tasks();
    }
    let Ok(raw) = std::fs::read_to_string(path) else {
        return default_benchmark_tasks();
    };
    match parse_task_list(&raw) {
        Some(tasks) if !tasks.is_empty() => tasks,
        _ => default_benchmark_tasks(),
    }
}

/// Load an optional regression corpus, falling back to an empty list
/// (unlike [`load_benchmark_tasks`], there is no built-in default).
pub fn load_regression_tasks(path: Option<&Path>) -> Vec<BenchmarkTask> {
    let Some(path) = path else {
        return Vec::new();
    };
    if !path.exists() {
        return Vec::new();
    }
    let Ok(raw) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    parse_task_list(&raw).unwrap_or_default()
}

/// Merge a base and an extras corpus, deduping by lowercased id (base
/// entries win ties).
pub fn merge_benchmark_tasks(base: &[BenchmarkTask], extras: &[BenchmarkTask]) -> Vec<BenchmarkTask> {
    let mut merged = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for task in base.iter().chain(extras.iter()) {
        if task.id.trim().is_empty() || task.title.trim().is_empty() || task.description.trim().is_empty() {
            continue;
        }
        let key = task.id.to_lowercase();
        if !seen.insert(key) {
            continue;
        }
        merged.push(task.clone());
    }
    merged
}

/// One task's terminal outcome for the purposes of benchmark
/// aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkTaskResult {
    pub task_id: String,
    pub status: String,
    pub reason: Option<String>,
    pub duration_seconds: f64,
}

/// Aggregated pass/fail/timeout rates for one benchmark variant's run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub total: usize,
    pub passed: usize,
    pub failed_gate: usize,
    pub failed_system: usize,
    pub canceled: usize,
    pub timeout_like: usize,
    pub pass_rate: f64,
    pub failed_gate_rate: f64,
    pub failed_system_rate: f64,
    pub timeout_like_rate: f64,
    pub avg_duration_seconds: f64,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute pass/failed_gate/failed_system/canceled counts and rates,
/// plus a `timeout_like` count for reasons mentioning `timeout` or
/// `watchdog`, over one variant's terminal results.
pub fn summarize_benchmark_results(results: &[BenchmarkTaskResult]) -> BenchmarkSummary {
    let total = results.len();
    let passed = results.iter().filter(|r| r.status == "passed").count();
    let failed_gate = results.iter().filter(|r| r.status == "failed_gate").count();
    let failed_system = results.iter().filter(|r| r.status == "failed_system").count();
    let canceled = results.iter().filter(|r| r.status == "canceled").count();
    let timeout_like = results
        .iter()
        .filter(|r| {
            let reason = r.reason.as_deref().unwrap_or_default().to_lowercase();
            reason.contains("timeout") || reason.contains("watchdog")
        })
        .count();

    let durations: Vec<f64> = results
        .iter()
        .map(|r| r.duration_seconds)
        .filter(|d| *d > 0.0)
        .collect();
    let avg_duration = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<f64>() / durations.len() as f64
    };

    let rate = |count: usize| -> f64 {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        }
    };

    BenchmarkSummary {
        total,
        passed,
        failed_gate,
        failed_system,
        canceled,
        timeout_like,
        pass_rate: round4(rate(passed)),
        failed_gate_rate: round4(rate(failed_gate)),
        failed_system_rate: round4(rate(failed_system)),
        timeout_like_rate: round4(rate(timeout_like)),
        avg_duration_seconds: round2(avg_duration),
    }
}

/// B-minus-A deltas over two variant summaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub pass_rate_delta: f64,
    pub timeout_like_rate_delta: f64,
    pub failed_gate_rate_delta: f64,
    pub failed_system_rate_delta: f64,
    pub avg_duration_seconds_delta: f64,
}

pub fn compare_benchmark_summaries(a: &BenchmarkSummary, b: &BenchmarkSummary) -> BenchmarkComparison {
    BenchmarkComparison {
        pass_rate_delta: round4(b.pass_rate - a.pass_rate),
        timeout_like_rate_delta: round4(b.timeout_like_rate - a.timeout_like_rate),
        failed_gate_rate_delta: round4(b.failed_gate_rate - a.failed_gate_rate),
        failed_system_rate_delta: round4(b.failed_system_rate - a.failed_system_rate),
        avg_duration_seconds_delta: round2(b.avg_duration_seconds - a.avg_duration_seconds),
    }
}

/// Render the two-variant markdown report comparing both pool variants.
#[allow(clippy::too_many_arguments)]
pub fn build_benchmark_markdown(
    variant_a_name: &str,
    variant_b_name: &str,
    summary_a: &BenchmarkSummary,
    summary_b: &BenchmarkSummary,
    comparison: &BenchmarkComparison,
    generated_at: &str,
) -> String {
    format!(
        "# Benchmark A/B Report\n\n\
         Generated at: {generated_at}\n\n\
         ## Variant A\n\
         - Name: {variant_a_name}\n\
         - Pass rate: {pa}\n\
         - Timeout-like rate: {ta}\n\
         - Failed-gate rate: {fga}\n\
         - Failed-system rate: {fsa}\n\
         - Avg duration seconds: {da}\n\n\
         ## Variant B\n\
         - Name: {variant_b_name}\n\
         - Pass rate: {pb}\n\
         - Timeout-like rate: {tb}\n\
         - Failed-gate rate: {fgb}\n\
         - Failed-system rate: {fsb}\n\
         - Avg duration seconds: {db}\n\n\
         ## Delta (B - A)\n\
         - pass_rate_delta: {prd}\n\
         - timeout_like_rate_delta: {trd}\n\
         - failed_gate_rate_delta: {fgd}\n\
         - failed_system_rate_delta: {fsd}\n\
         - avg_duration_seconds_delta: {avd}\n",
        pa = summary_a.pass_rate,
        ta = summary_a.timeout_like_rate,
        fga = summary_a.failed_gate_rate,
        fsa = summary_a.failed_system_rate,
        da = summary_a.avg_duration_seconds,
        pb = summary_b.pass_rate,
        tb = summary_b.timeout_like_rate,
        fgb = summary_b.failed_gate_rate,
        fsb = summary_b.failed_system_rate,
        db = summary_b.avg_duration_seconds,
        prd = comparison.pass_rate_delta,
        trd = comparison.timeout_like_rate_delta,
        fgd = comparison.failed_gate_rate_delta,
        fsd = comparison.failed_system_rate_delta,
        avd = comparison.avg_duration_seconds_delta,
    )
}
