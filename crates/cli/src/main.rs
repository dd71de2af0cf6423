// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! agentcheck - multi-participant agent debate orchestration CLI

mod commands;
mod context;
mod output;

use clap::{Parser, Subcommand};
use commands::{analysis, automation, task};
use context::CliContext;
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "agentcheck",
    version,
    about = "Drives multi-participant agent debate tasks to a terminal verdict"
)]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task lifecycle: create, show, list, cancel, run.
    Task(task::TaskArgs),
    /// Event analyser: history, reviewer drift, stats, PR summaries.
    Analysis(analysis::AnalysisArgs),
    /// Overnight/benchmark automation driver.
    Automation(automation::AutomationArgs),
    /// Cross-task status dashboard (alias for `analysis stats`).
    Status,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    if let Err(err) = run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let ctx = CliContext::load()?;

    match cli.command {
        Commands::Task(args) => task::handle(args, &ctx, cli.output).await,
        Commands::Analysis(args) => analysis::handle(args, &ctx, cli.output),
        Commands::Automation(args) => automation::handle(args, &ctx, cli.output),
        Commands::Status => analysis::handle(
            analysis::AnalysisArgs {
                command: analysis::AnalysisCommand::Stats,
            },
            &ctx,
            cli.output,
        ),
    }
}
