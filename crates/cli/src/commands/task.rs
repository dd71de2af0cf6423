// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agentcheck task ...` — create, inspect, drive, and cancel tasks.

use crate::context::CliContext;
use crate::output::{self, OutputFormat};
use agentcheck_core::TaskId;
use agentcheck_engine::watchdog_sweep;
use agentcheck_service::CreateTaskRequest;
use clap::{Args, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Validate and admit a new task in `queued` status.
    Create(CreateArgs),
    /// Show one task's full row.
    Show { id: String },
    /// List the most recent tasks.
    List {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Request cancellation of a running or waiting task.
    Cancel { id: String },
    /// Admit a `queued` task (if capacity allows) and drive it through
    /// the workflow engine to a terminal status or `waiting_manual`.
    Run { id: String },
    /// Force-fail tasks stuck in `running` past the given timeout.
    WatchdogSweep {
        #[arg(long, default_value_t = 1800)]
        timeout_secs: u64,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Author participant id, `provider:role` (e.g. `claude:author`).
    #[arg(long)]
    pub author: String,
    /// Reviewer participant ids; may be repeated.
    #[arg(long = "reviewer")]
    pub reviewers: Vec<String>,
    #[arg(long)]
    pub project_path: Option<PathBuf>,
    #[arg(long)]
    pub workspace_path: PathBuf,
    #[arg(long)]
    pub sandbox: bool,
    #[arg(long)]
    pub sandbox_path: Option<PathBuf>,
    #[arg(long)]
    pub sandbox_cleanup_on_pass: bool,
    #[arg(long)]
    pub test_command: Option<String>,
    #[arg(long)]
    pub lint_command: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub max_rounds: u32,
    #[arg(long)]
    pub self_loop: bool,
    #[arg(long)]
    pub auto_merge: bool,
    #[arg(long)]
    pub merge_target: Option<PathBuf>,
    #[arg(long, default_value = "balanced")]
    pub repair_mode: String,
    #[arg(long)]
    pub debate: bool,
    #[arg(long)]
    pub plain: bool,
    #[arg(long)]
    pub stream: bool,
    #[arg(long, default_value_t = 0)]
    pub evolution_level: u8,
    #[arg(long)]
    pub evolve_until: Option<String>,
    #[arg(long, default_value = "en")]
    pub language: String,
    #[arg(long = "provider-model", value_parser = parse_key_value)]
    pub provider_models: Vec<(String, String)>,
    #[arg(long = "participant-model", value_parser = parse_key_value)]
    pub participant_models: Vec<(String, String)>,
    #[arg(long)]
    pub claude_team_agents: bool,
    #[arg(long)]
    pub codex_multi_agents: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid input format '{s}': must be key=value"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn to_map(pairs: Vec<(String, String)>) -> BTreeMap<String, String> {
    pairs.into_iter().collect()
}

pub async fn handle(args: TaskArgs, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<()> {
    match args.command {
        TaskCommand::Create(create) => create_task(create, ctx, format),
        TaskCommand::Show { id } => show_task(&id, ctx, format),
        TaskCommand::List { limit } => list_tasks(limit, ctx, format),
        TaskCommand::Cancel { id } => cancel_task(&id, ctx, format),
        TaskCommand::Run { id } => run_task(&id, ctx, format).await,
        TaskCommand::WatchdogSweep { timeout_secs } => sweep(timeout_secs, ctx, format),
    }
}

fn create_task(args: CreateArgs, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<()> {
    let request = CreateTaskRequest {
        title: args.title,
        description: args.description,
        author_participant: args.author,
        reviewer_participants: args.reviewers,
        project_path: args.project_path,
        workspace_path: args.workspace_path,
        sandbox_mode: args.sandbox,
        sandbox_path: args.sandbox_path,
        sandbox_cleanup_on_pass: args.sandbox_cleanup_on_pass,
        test_command: args.test_command,
        lint_command: args.lint_command,
        max_rounds: args.max_rounds,
        self_loop_mode: args.self_loop,
        auto_merge: args.auto_merge,
        merge_target_path: args.merge_target,
        repair_mode: args.repair_mode,
        debate_mode: args.debate,
        plain_mode: args.plain,
        stream_mode: args.stream,
        evolution_level: args.evolution_level,
        evolve_until: args.evolve_until,
        conversation_language: args.language,
        provider_models: to_map(args.provider_models),
        provider_model_params: BTreeMap::new(),
        participant_models: to_map(args.participant_models),
        participant_model_params: BTreeMap::new(),
        claude_team_agents: args.claude_team_agents,
        codex_multi_agents: args.codex_multi_agents,
        claude_team_agents_overrides: BTreeMap::new(),
        codex_multi_agents_overrides: BTreeMap::new(),
    };

    let id = Uuid::new_v4().to_string();
    let task = ctx.service().create_task(&id, request)?;
    output::print(format, &task, || {
        println!("created task {} ({})", task.task_id, task.status);
    })
}

fn show_task(id: &str, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<()> {
    let task = ctx.service().get_task(&TaskId::from(id))?;
    output::print(format, &task, || {
        println!(
            "{}  status={}  rounds={}/{}  reason={}",
            task.task_id,
            task.status,
            task.rounds_completed,
            task.max_rounds,
            task.last_gate_reason.as_deref().unwrap_or("n/a")
        );
    })
}

fn list_tasks(limit: usize, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<()> {
    let tasks = ctx.repository.list_tasks(limit)?;
    output::print(format, &tasks, || {
        for task in &tasks {
            println!("{}  {:<14}  {}", task.task_id, task.status, task.title);
        }
    })
}

fn cancel_task(id: &str, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<()> {
    let task_id = TaskId::from(id);
    ctx.service().request_cancel(&task_id)?;
    output::print(format, &serde_json::json!({"task_id": id, "cancel_requested": true}), || {
        println!("cancellation requested for {id}");
    })
}

async fn run_task(id: &str, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<()> {
    let task_id = TaskId::from(id);
    ctx.service().try_start(&task_id)?;
    let task = ctx.engine().run_task(&task_id).await?;
    output::print(format, &task, || {
        println!(
            "{} finished as {} (reason={})",
            task.task_id,
            task.status,
            task.last_gate_reason.as_deref().unwrap_or("n/a")
        );
    })
}

fn sweep(timeout_secs: u64, ctx: &CliContext, format: OutputFormat) -> anyhow::Result<()> {
    let failed = watchdog_sweep(
        ctx.repository.as_ref(),
        Duration::from_secs(timeout_secs),
        chrono::Utc::now(),
    )?;
    output::print(format, &failed, || {
        println!("force-failed {} stalled task(s)", failed.len());
        for id in &failed {
            println!("  {id}");
        }
    })
}
