// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The participant runner: spawns a provider CLI, feeds it a prompt, and
//! classifies the result.

use crate::argv::{default_argv, ArgvBuilder};
use crate::error::RunnerError;
use crate::parse::{is_provider_limit_output, parse_next_action, parse_verdict};
use agentcheck_core::{Participant, Provider, ReviewVerdict};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Prompt retry budget: attempts beyond the first clip the prompt to this
/// many characters.
const RETRY_CLIP_CHARS: usize = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    Retry,
    Pass,
    Stop,
}

impl NextAction {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "retry" => Some(NextAction::Retry),
            "pass" => Some(NextAction::Pass),
            "stop" => Some(NextAction::Stop),
            _ => None,
        }
    }
}

/// A single participant invocation request.
pub struct RunRequest<'a> {
    pub participant: &'a Participant,
    pub prompt: String,
    pub cwd: &'a Path,
    pub timeout: Duration,
    pub timeout_retries: u32,
    pub model: Option<String>,
    pub model_params: Vec<String>,
    pub claude_team_agents: bool,
    pub codex_multi_agents: bool,
}

/// The result of a successful participant invocation.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub output: String,
    pub verdict: ReviewVerdict,
    pub next_action: Option<NextAction>,
    pub returncode: i32,
    pub duration_seconds: f64,
}

/// Drives provider CLIs as subprocesses. Registered commands can be
/// overridden per-process (mirrors `AWE_<PROVIDER>_COMMAND`).
pub struct ParticipantRunner {
    commands: HashMap<Provider, Vec<String>>,
    dry_run: bool,
}

impl ParticipantRunner {
    pub fn new(dry_run: bool) -> Self {
        Self {
            commands: HashMap::new(),
            dry_run,
        }
    }

    /// Override the default argv template for a provider.
    pub fn register_command(&mut self, provider: Provider, argv: Vec<String>) {
        self.commands.insert(provider, argv);
    }

    fn resolve_base_argv(&self, provider: Provider) -> Option<Vec<String>> {
        self.commands
            .get(&provider)
            .cloned()
            .or_else(|| Some(default_argv(provider)))
    }

    pub async fn run(&self, req: RunRequest<'_>) -> Result<RunOutcome, RunnerError> {
        let provider = req.participant.provider;
        let provider_name = provider.as_str().to_string();

        if self.dry_run {
            return Ok(Self::dry_run_outcome());
        }

        let base = self
            .resolve_base_argv(provider)
            .ok_or(RunnerError::CommandNotConfigured {
                provider: provider_name.clone(),
            })?;

        let builder = ArgvBuilder {
            provider,
            model: req.model.clone(),
            model_params: req.model_params.clone(),
            claude_team_agents: req.claude_team_agents,
            codex_multi_agents: req.codex_multi_agents,
        };
        let argv = builder.build(base);
        let rendered = argv.join(" ");

        let attempts = 1 + req.timeout_retries;
        let mut prompt = req.prompt.clone();
        let mut last_timeout = false;

        for attempt in 0..attempts {
            if attempt > 0 && prompt.chars().count() > RETRY_CLIP_CHARS {
                prompt = clip_prompt_for_retry(&prompt);
            }

            let start = std::time::Instant::now();
            let outcome = self
                .spawn_and_wait(&argv, req.cwd, &prompt, req.timeout)
                .await;
            let elapsed = start.elapsed().as_secs_f64();

            match outcome {
                Ok(SpawnResult::Completed { output, returncode }) => {
                    if is_provider_limit_output(&output) {
                        return Err(RunnerError::ProviderLimit {
                            provider: provider_name,
                        });
                    }
                    let merged = output;
                    let verdict = parse_verdict(&merged);
                    let next_action = parse_next_action(&merged).and_then(|s| NextAction::parse(&s));
                    return Ok(RunOutcome {
                        output: merged,
                        verdict,
                        next_action,
                        returncode,
                        duration_seconds: elapsed,
                    });
                }
                Ok(SpawnResult::NotFound) => {
                    return Err(RunnerError::CommandNotFound {
                        provider: provider_name,
                        command: rendered,
                    });
                }
                Ok(SpawnResult::TimedOut) => {
                    last_timeout = true;
                    warn!(provider = %provider_name, attempt, "participant invocation timed out");
                    continue;
                }
                Err(err) => return Err(err),
            }
        }

        if last_timeout {
            Err(RunnerError::CommandTimeout {
                provider: provider_name,
                command: rendered,
            })
        } else {
            Err(RunnerError::CommandFailed {
                provider: provider_name,
                command: rendered,
                returncode: -1,
            })
        }
    }

    async fn spawn_and_wait(
        &self,
        argv: &[String],
        cwd: &Path,
        prompt: &str,
        timeout: Duration,
    ) -> Result<SpawnResult, RunnerError> {
        let Some((program, args)) = argv.split_first() else {
            return Ok(SpawnResult::NotFound);
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SpawnResult::NotFound);
            }
            Err(e) => {
                debug!(error = %e, "failed to spawn participant process");
                return Ok(SpawnResult::NotFound);
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(prompt.as_bytes()).await;
        }

        let wait = async {
            let status = child.wait().await.map_err(|e| RunnerError::CommandFailed {
                provider: String::new(),
                command: String::new(),
                returncode: e.raw_os_error().unwrap_or(-1),
            })?;

            let mut stdout = String::new();
            let mut stderr = String::new();
            if let Some(mut out) = child.stdout.take() {
                let _ = out.read_to_string(&mut stdout).await;
            }
            if let Some(mut err) = child.stderr.take() {
                let _ = err.read_to_string(&mut stderr).await;
            }

            let mut output = stdout;
            if !status.success() && !stderr.is_empty() {
                output.push('\n');
                output.push_str(&stderr);
            }

            Ok::<_, RunnerError>(SpawnResult::Completed {
                output,
                returncode: status.code().unwrap_or(-1),
            })
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => {
                let _ = child.kill().await;
                Ok(SpawnResult::TimedOut)
            }
        }
    }

    fn dry_run_outcome() -> RunOutcome {
        RunOutcome {
            output: "[dry-run participant]\nVERDICT: NO_BLOCKER\nNEXT_ACTION: pass\nSimulated output for orchestration smoke testing.".to_string(),
            verdict: ReviewVerdict::NoBlocker,
            next_action: Some(NextAction::Pass),
            returncode: 0,
            duration_seconds: 0.01,
        }
    }
}

enum SpawnResult {
    Completed { output: String, returncode: i32 },
    NotFound,
    TimedOut,
}

/// Clip a prompt for a retry attempt: first 1200 chars plus a truncation
/// marker noting how much was removed.
fn clip_prompt_for_retry(prompt: &str) -> String {
    let char_count = prompt.chars().count();
    if char_count <= RETRY_CLIP_CHARS {
        return prompt.to_string();
    }
    let head: String = prompt.chars().take(RETRY_CLIP_CHARS).collect();
    let removed = char_count - RETRY_CLIP_CHARS;
    format!("{head}\n\n[retry prompt clipped: {removed} chars removed]")
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
