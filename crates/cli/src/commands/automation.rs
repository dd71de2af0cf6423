// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agentcheck automation ...` — the single-instance overnight tick and
//! the A/B benchmark corpus/summary/report commands.

use crate::context::CliContext;
use crate::output::{self, OutputFormat};
use agentcheck_automation::{
    build_benchmark_markdown, compare_benchmark_summaries, default_benchmark_tasks,
    should_retry_start_for_concurrency_limit, should_switch_back_to_primary, should_switch_to_fallback,
    summarize_benchmark_results, BenchmarkTaskResult, SingleInstanceLock,
};
use agentcheck_core::TaskStatus;
use agentcheck_engine::watchdog_sweep;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct AutomationArgs {
    #[command(subcommand)]
    pub command: AutomationCommand,
}

#[derive(Subcommand)]
pub enum AutomationCommand {
    /// Run one overnight-driver tick: sweep the watchdog, admit queued
    /// tasks, and flag any pool-switch signal a recently failed task
    /// raises.
    OvernightTick {
        #[arg(long, default_value = "./artifacts/.overnight.lock")]
        lock_path: PathBuf,
        #[arg(long, default_value_t = 1800)]
        watchdog_timeout_secs: u64,
    },
    /// Print the built-in six-task benchmark corpus.
    BenchmarkCorpus,
    /// Summarize a JSON array of `BenchmarkTaskResult` into pass/fail
    /// rates and mean duration for one variant.
    BenchmarkSummarize { results: PathBuf },
    /// Compare two variants' summarized results and render the
    /// markdown A/B report.
    BenchmarkReport {
        variant_a_results: PathBuf,
        variant_b_results: PathBuf,
        #[arg(long, default_value = "A")]
        variant_a_name: String,
        #[arg(long, default_value = "B")]
        variant_b_name: String,
    },
}

pub fn handle(args: AutomationArgs, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<()> {
    match args.command {
        AutomationCommand::OvernightTick {
            lock_path,
            watchdog_timeout_secs,
        } => overnight_tick(&lock_path, watchdog_timeout_secs, ctx, format),
        AutomationCommand::BenchmarkCorpus => {
            output::print_json(&default_benchmark_tasks())
        }
        AutomationCommand::BenchmarkSummarize { results } => benchmark_summarize(&results, format),
        AutomationCommand::BenchmarkReport {
            variant_a_results,
            variant_b_results,
            variant_a_name,
            variant_b_name,
        } => benchmark_report(&variant_a_results, &variant_b_results, &variant_a_name, &variant_b_name),
    }
}

fn overnight_tick(
    lock_path: &PathBuf,
    watchdog_timeout_secs: u64,
    ctx: &CliContext,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let _lock = SingleInstanceLock::acquire(lock_path)?;

    let force_failed = watchdog_sweep(
        ctx.repository.as_ref(),
        Duration::from_secs(watchdog_timeout_secs),
        chrono::Utc::now(),
    )?;

    let service = ctx.service();
    let mut admitted = Vec::new();
    let mut retried = Vec::new();
    let mut pool_signals = Vec::new();
    for task in ctx.repository.list_tasks(usize::MAX)? {
        match task.status {
            TaskStatus::Queued => {
                let status_str = task.status.to_string();
                if should_retry_start_for_concurrency_limit(&status_str, task.last_gate_reason.as_deref()) {
                    retried.push(task.task_id.to_string());
                }
                let updated = service.try_start(&task.task_id)?;
                if updated.status == TaskStatus::Running {
                    admitted.push(updated.task_id.to_string());
                }
            }
            TaskStatus::FailedSystem => {
                let status_str = task.status.to_string();
                let reason = task.last_gate_reason.as_deref();
                if should_switch_to_fallback(&status_str, reason) {
                    pool_signals.push(format!("{}: switch to fallback pool", task.task_id));
                } else if should_switch_back_to_primary(&status_str, reason) {
                    pool_signals.push(format!("{}: switch back to primary pool", task.task_id));
                }
            }
            _ => {}
        }
    }

    let report = serde_json::json!({
        "force_failed": force_failed,
        "admitted": admitted,
        "retried_for_concurrency_limit": retried,
        "pool_signals": pool_signals,
    });
    output::print(format, &report, || {
        println!("force-failed: {}", force_failed.len());
        println!("admitted: {}", admitted.len());
        for signal in &pool_signals {
            println!("  {signal}");
        }
    })
}

fn benchmark_summarize(results_path: &PathBuf, format: OutputFormat) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(results_path)?;
    let results: Vec<BenchmarkTaskResult> = serde_json::from_str(&raw)?;
    let summary = summarize_benchmark_results(&results);
    output::print(format, &summary, || {
        println!(
            "total={} pass_rate={:.3} failed_gate_rate={:.3} failed_system_rate={:.3} timeout_like_rate={:.3} avg_duration_s={:.1}",
            summary.total,
            summary.pass_rate,
            summary.failed_gate_rate,
            summary.failed_system_rate,
            summary.timeout_like_rate,
            summary.avg_duration_seconds
        );
    })
}

fn benchmark_report(
    variant_a_results: &PathBuf,
    variant_b_results: &PathBuf,
    variant_a_name: &str,
    variant_b_name: &str,
) -> anyhow::Result<()> {
    let a: Vec<BenchmarkTaskResult> = serde_json::from_str(&std::fs::read_to_string(variant_a_results)?)?;
    let b: Vec<BenchmarkTaskResult> = serde_json::from_str(&std::fs::read_to_string(variant_b_results)?)?;
    let summary_a = summarize_benchmark_results(&a);
    let summary_b = summarize_benchmark_results(&b);
    let comparison = compare_benchmark_summaries(&summary_a, &summary_b);
    let generated_at = chrono::Utc::now().to_rfc3339();
    let markdown = build_benchmark_markdown(
        variant_a_name,
        variant_b_name,
        &summary_a,
        &summary_b,
        &comparison,
        &generated_at,
    );
    print!("{markdown}");
    Ok(())
}
