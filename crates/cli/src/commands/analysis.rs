// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agentcheck analysis ...` — per-task history, reviewer drift, cross-
//! task stats, and the GitHub PR summary renderer.

use crate::context::CliContext;
use crate::output::{self, OutputFormat};
use agentcheck_analysis::{build_github_pr_summary, build_task_history, compute_reviewer_drift, compute_task_stats};
use agentcheck_core::TaskId;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct AnalysisArgs {
    #[command(subcommand)]
    pub command: AnalysisCommand,
}

#[derive(Subcommand)]
pub enum AnalysisCommand {
    /// Findings, revisions, disputes, and next steps for one task.
    History { id: String },
    /// Reviewer drift and failure-taxonomy trend over recent tasks.
    Drift {
        #[arg(long, default_value_t = 300)]
        limit: usize,
    },
    /// Cross-task status counts and recent pass/fail rates.
    Stats,
    /// Render one task's history as a pull-request-ready markdown block.
    PrSummary { id: String },
}

pub fn handle(args: AnalysisArgs, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<()> {
    match args.command {
        AnalysisCommand::History { id } => history(&id, ctx, format),
        AnalysisCommand::Drift { limit } => drift(limit, ctx, format),
        AnalysisCommand::Stats => stats(ctx, format),
        AnalysisCommand::PrSummary { id } => pr_summary(&id, ctx, format),
    }
}

fn history(id: &str, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<()> {
    let task_id = TaskId::from(id);
    let history = build_task_history(ctx.repository.as_ref(), &ctx.artifacts, &task_id)?;
    output::print(format, &history, || {
        println!("{}  status={}", history.task_id, history.status);
        println!("core findings:");
        for line in &history.core_findings {
            println!("  - {line}");
        }
        println!("disputes:");
        for d in &history.disputes {
            println!("  - {} | {}: {}", d.participant, d.verdict, d.note);
        }
        println!("next steps:");
        for line in &history.next_steps {
            println!("  - {line}");
        }
    })
}

fn drift(limit: usize, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<()> {
    let report = compute_reviewer_drift(ctx.repository.as_ref(), limit)?;
    output::print(format, &report, || {
        println!(
            "window: {} tasks, {} failed_gate",
            report.window_tasks, report.window_failed_gate
        );
        println!("reviewer drift (highest first):");
        for row in &report.reviewer_drift {
            println!(
                "  {:<24} reviews={:<4} adverse_rate={:.3} drift={:.3}",
                row.participant, row.reviews, row.adverse_rate, row.drift_score
            );
        }
        println!("failure taxonomy:");
        for entry in &report.failure_taxonomy {
            println!("  {:<24} count={:<4} share={:.3}", entry.bucket, entry.count, entry.share);
        }
    })
}

fn stats(ctx: &CliContext, format: OutputFormat) -> anyhow::Result<()> {
    let stats = compute_task_stats(ctx.repository.as_ref())?;
    output::print(format, &stats, || {
        println!("total_tasks: {}", stats.total_tasks);
        println!("active_tasks: {}", stats.active_tasks);
        for (status, count) in &stats.status_counts {
            println!("  {status:<14} {count}");
        }
        println!(
            "recent {} terminal: pass={:.3} failed_gate={:.3} failed_system={:.3} mean_duration_s={:.1}",
            stats.recent_terminal_total,
            stats.pass_rate_50,
            stats.failed_gate_rate_50,
            stats.failed_system_rate_50,
            stats.mean_task_duration_seconds_50
        );
    })
}

fn pr_summary(id: &str, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<()> {
    let task_id = TaskId::from(id);
    let summary = build_github_pr_summary(ctx.repository.as_ref(), &ctx.artifacts, &task_id)?;
    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "task_id": summary.task_id,
            "project_path": summary.project_path,
            "markdown": summary.markdown,
            "artifacts": summary.artifacts,
        })),
        OutputFormat::Text => {
            print!("{}", summary.markdown);
            Ok(())
        }
    }
}
