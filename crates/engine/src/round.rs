// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workflow engine: drives one task through the bounded
//! debate-and-verify loop described by the round algorithm —
//! discussion, review, verification, gate, and conditional fusion —
//! until it reaches a terminal status or `waiting_manual`.

use crate::command::{CommandExecutor, CommandOutcome};
use crate::error::EngineError;
use crate::stall::{is_deadlocked, verdict_counts, ConsensusTracker};
use crate::strategy::{apply_strategy_hint, build_strategy_hint};
use agentcheck_artifacts::ArtifactStore;
use agentcheck_core::{
    evaluate_gate, Participant, ReviewVerdict, Task, TaskEventKind, TaskId, TaskStatus,
};
use agentcheck_fusion::{compute_manifest, FusionManager, FusionManifest};
use agentcheck_runner::{ParticipantRunner, RunRequest, RunnerError};
use agentcheck_storage::TaskRepository;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const FUSION_BASELINE_ARTIFACT: &str = "fusion_baseline";

/// Runtime configuration that doesn't live on the task row itself.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub participant_timeout: Duration,
    pub participant_timeout_retries: u32,
    pub command_timeout: Duration,
    pub consensus_retry_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            participant_timeout: Duration::from_secs(300),
            participant_timeout_retries: 0,
            command_timeout: Duration::from_secs(600),
            consensus_retry_limit: 2,
        }
    }
}

/// Drives the round algorithm for tasks handed to [`WorkflowEngine::run_task`].
pub struct WorkflowEngine {
    repository: Arc<dyn TaskRepository>,
    runner: Arc<ParticipantRunner>,
    command_executor: Arc<dyn CommandExecutor>,
    artifacts: Option<Arc<ArtifactStore>>,
    config: EngineConfig,
}

/// What to do next after one round finished.
enum RoundStep {
    KeepGoing,
    Stop(Task),
}

impl WorkflowEngine {
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        runner: Arc<ParticipantRunner>,
        command_executor: Arc<dyn CommandExecutor>,
        artifacts: Option<Arc<ArtifactStore>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            repository,
            runner,
            command_executor,
            artifacts,
            config,
        }
    }

    /// Drive `task_id` through rounds until it reaches a terminal status
    /// or `waiting_manual`. The caller is responsible for admission
    /// (moving `queued` -> `running` before calling this) and for
    /// re-invoking it after an operator resumes a `waiting_manual` task.
    pub async fn run_task(&self, task_id: &TaskId) -> Result<Task, EngineError> {
        let mut tracker = ConsensusTracker::new();

        loop {
            let task = self
                .repository
                .get_task(task_id)?
                .ok_or_else(|| EngineError::TaskNotFound(task_id.as_str().to_string()))?;

            if task.status != TaskStatus::Running {
                return Ok(task);
            }

            if self.repository.is_cancel_requested(task_id)? {
                let canceled = self.repository.update_task_status_if(
                    task_id,
                    TaskStatus::Running,
                    TaskStatus::Canceled,
                    Some("cancel_requested"),
                    None,
                    Some(false),
                )?;
                if let Some(task) = canceled {
                    return Ok(task);
                }
                continue;
            }

            match self.run_round(&task, &mut tracker).await? {
                RoundStep::KeepGoing => continue,
                RoundStep::Stop(task) => return Ok(task),
            }
        }
    }

    async fn run_round(
        &self,
        task: &Task,
        tracker: &mut ConsensusTracker,
    ) -> Result<RoundStep, EngineError> {
        let round_number = task.rounds_completed + 1;
        let participants = task
            .participants()
            .map_err(EngineError::InvalidParticipants)?;
        let (author, reviewers) = participants
            .split_first()
            .ok_or_else(|| EngineError::InvalidParticipants("no participants".to_string()))?;

        let workspace = active_workspace(task);
        self.ensure_fusion_baseline(task, workspace)?;

        let prior_hint = task.last_gate_reason.as_deref().and_then(|reason| {
            if task.rounds_completed == 0 {
                None
            } else {
                Some(build_strategy_hint(reason, None))
            }
        });
        let author_prompt = match &prior_hint {
            Some(hint) => apply_strategy_hint(&task.description, hint),
            None => task.description.clone(),
        };

        // Step 2: discussion.
        let proposal = match self
            .invoke_participant(task, author, &author_prompt, workspace)
            .await
        {
            Ok(outcome) => outcome.output,
            Err(err) => {
                return Ok(RoundStep::Stop(
                    self.fail_system(task, round_number, "discussion", &err)?,
                ));
            }
        };
        self.emit(
            task,
            round_number,
            TaskEventKind::Discussion {
                participant: author.id.clone(),
                output: proposal.clone(),
            },
        )?;

        // Step 3: review.
        let mut verdicts = Vec::with_capacity(reviewers.len());
        for reviewer in reviewers {
            let prompt = build_review_prompt(task, &proposal);
            match self
                .invoke_participant(task, reviewer, &prompt, workspace)
                .await
            {
                Ok(outcome) => {
                    verdicts.push(outcome.verdict);
                    self.emit(
                        task,
                        round_number,
                        TaskEventKind::Review {
                            participant: reviewer.id.clone(),
                            verdict: outcome.verdict,
                            output: outcome.output,
                        },
                    )?;
                }
                Err(err) => {
                    self.emit(
                        task,
                        round_number,
                        TaskEventKind::ReviewError {
                            participant: reviewer.id.clone(),
                            reason: err.reason_class().to_string(),
                        },
                    )?;
                    self.emit(
                        task,
                        round_number,
                        TaskEventKind::Review {
                            participant: reviewer.id.clone(),
                            verdict: ReviewVerdict::Unknown,
                            output: format!("[review_error] {err}"),
                        },
                    )?;
                    verdicts.push(ReviewVerdict::Unknown);
                }
            }
        }

        let deadlocked = is_deadlocked(&verdicts);
        if let Some(stall_kind) = tracker.record_round(deadlocked, self.config.consensus_retry_limit) {
            self.emit(
                task,
                round_number,
                TaskEventKind::ProposalConsensusStalled {
                    stall_kind,
                    attempt: tracker.attempt(),
                    retry_limit: self.config.consensus_retry_limit,
                    verdict_counts: verdict_counts(&verdicts),
                },
            )?;
            let updated = self.repository.update_task_status_if(
                &task.task_id,
                TaskStatus::Running,
                TaskStatus::WaitingManual,
                Some("proposal_consensus_stalled"),
                None,
                None,
            )?;
            return Ok(RoundStep::Stop(match updated {
                Some(task) => task,
                None => self
                    .repository
                    .get_task(&task.task_id)?
                    .ok_or_else(|| EngineError::TaskNotFound(task.task_id.as_str().to_string()))?,
            }));
        }

        // Step 4: verification.
        let tests_ok = self
            .run_verification_command(task.test_command.as_deref(), workspace)
            .await;
        let lint_ok = self
            .run_verification_command(task.lint_command.as_deref(), workspace)
            .await;

        // Step 5: gate.
        let outcome = evaluate_gate(tests_ok, lint_ok, verdicts.iter().copied());
        if outcome.passed {
            self.emit(
                task,
                round_number,
                TaskEventKind::GatePassed {
                    reason: outcome.reason.clone(),
                },
            )?;
            let passed = self.repository.update_task_status_if(
                &task.task_id,
                TaskStatus::Running,
                TaskStatus::Passed,
                Some(&outcome.reason),
                Some(round_number),
                None,
            )?;
            let mut final_task = match passed {
                Some(task) => task,
                None => {
                    return Ok(RoundStep::Stop(
                        self.repository
                            .get_task(&task.task_id)?
                            .ok_or_else(|| EngineError::TaskNotFound(task.task_id.as_str().to_string()))?,
                    ))
                }
            };

            // Step 6: fusion.
            if final_task.auto_merge && final_task.sandbox_mode {
                if let Some(merged) = self.run_fusion(&final_task, round_number, workspace)? {
                    final_task = merged;
                }
            }

            return Ok(RoundStep::Stop(final_task));
        }

        self.emit(
            task,
            round_number,
            TaskEventKind::GateFailed {
                reason: outcome.reason.clone(),
            },
        )?;

        if round_number >= task.max_rounds {
            let failed = self.repository.update_task_status_if(
                &task.task_id,
                TaskStatus::Running,
                TaskStatus::FailedGate,
                Some(&outcome.reason),
                Some(round_number),
                None,
            )?;
            return Ok(RoundStep::Stop(match failed {
                Some(task) => task,
                None => self
                    .repository
                    .get_task(&task.task_id)?
                    .ok_or_else(|| EngineError::TaskNotFound(task.task_id.as_str().to_string()))?,
            }));
        }

        self.repository.update_task_status(
            &task.task_id,
            TaskStatus::Running,
            Some(&outcome.reason),
            Some(round_number),
        )?;
        Ok(RoundStep::KeepGoing)
    }

    async fn invoke_participant(
        &self,
        task: &Task,
        participant: &Participant,
        prompt: &str,
        workspace: &Path,
    ) -> Result<agentcheck_runner::RunOutcome, RunnerError> {
        let model = resolve_model(task, participant);
        let model_params = resolve_model_params(task, participant);
        self.runner
            .run(RunRequest {
                participant,
                prompt: prompt.to_string(),
                cwd: workspace,
                timeout: self.config.participant_timeout,
                timeout_retries: self.config.participant_timeout_retries,
                model,
                model_params,
                claude_team_agents: resolve_claude_team_agents(task, participant),
                codex_multi_agents: resolve_codex_multi_agents(task, participant),
            })
            .await
    }

    async fn run_verification_command(&self, command: Option<&str>, workspace: &Path) -> bool {
        let Some(command) = command else {
            return true;
        };
        let CommandOutcome { success, .. } = self
            .command_executor
            .run(command, workspace, self.config.command_timeout)
            .await;
        success
    }

    fn fail_system(
        &self,
        task: &Task,
        round_number: u32,
        stage: &str,
        err: &RunnerError,
    ) -> Result<Task, EngineError> {
        let reason = format!(
            "workflow_error: {} provider={} command={}",
            err.reason_class(),
            err.provider(),
            command_of(err),
        );
        self.emit(
            task,
            round_number,
            TaskEventKind::ProposalDiscussionError {
                reason: format!("{stage}: {err}"),
            },
        )?;
        warn!(task_id = %task.task_id, stage, %err, "participant invocation failed");
        let updated = self.repository.update_task_status_if(
            &task.task_id,
            TaskStatus::Running,
            TaskStatus::FailedSystem,
            Some(&reason),
            None,
            None,
        )?;
        match updated {
            Some(task) => Ok(task),
            None => self
                .repository
                .get_task(&task.task_id)?
                .ok_or_else(|| EngineError::TaskNotFound(task.task_id.as_str().to_string())),
        }
    }

    fn emit(
        &self,
        task: &Task,
        round: u32,
        kind: TaskEventKind,
    ) -> Result<(), EngineError> {
        let event = self.repository.append_event(&task.task_id, kind, Some(round))?;
        if let Some(artifacts) = &self.artifacts {
            if let Err(e) = artifacts.append_event_line(&event) {
                warn!(task_id = %task.task_id, error = %e, "failed to mirror event to artifact log");
            }
        }
        Ok(())
    }

    fn ensure_fusion_baseline(&self, task: &Task, workspace: &Path) -> Result<(), EngineError> {
        if !task.auto_merge || !task.sandbox_mode || task.rounds_completed != 0 {
            return Ok(());
        }
        let Some(artifacts) = &self.artifacts else {
            return Ok(());
        };
        if artifacts
            .read_artifact(task.task_id.as_str(), FUSION_BASELINE_ARTIFACT)?
            .is_some()
        {
            return Ok(());
        }
        let manifest = compute_manifest(workspace).unwrap_or_default();
        let value = serde_json::to_value(&manifest).unwrap_or(serde_json::Value::Null);
        artifacts.write_artifact(task.task_id.as_str(), FUSION_BASELINE_ARTIFACT, &value)?;
        Ok(())
    }

    fn run_fusion(
        &self,
        task: &Task,
        round_number: u32,
        workspace: &Path,
    ) -> Result<Option<Task>, EngineError> {
        let Some(artifacts) = &self.artifacts else {
            return Ok(None);
        };
        let baseline: FusionManifest = artifacts
            .read_artifact(task.task_id.as_str(), FUSION_BASELINE_ARTIFACT)?
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        let target = task
            .merge_target_path
            .as_deref()
            .unwrap_or(&task.project_path);
        let snapshot_root = artifacts
            .ensure_task_dir(task.task_id.as_str())?
            .join("fusion_snapshots");

        match FusionManager::merge(task.task_id.as_str(), workspace, target, &baseline, &snapshot_root) {
            Ok(outcome) => {
                info!(task_id = %task.task_id, mode = %outcome.mode, "auto-fusion completed");
                self.emit(
                    task,
                    round_number,
                    TaskEventKind::AutoMergeCompleted {
                        mode: outcome.mode,
                        changed_files: outcome.changed_files,
                        deleted_files: outcome.deleted_files,
                        snapshot_path: outcome.snapshot_path,
                        changelog_path: outcome.changelog_path,
                    },
                )?;
                Ok(None)
            }
            Err(err) => {
                warn!(task_id = %task.task_id, error = %err, "auto-fusion failed; task remains passed");
                self.emit(
                    task,
                    round_number,
                    TaskEventKind::HistoryEvent {
                        message: format!("auto_merge_failed: {err}"),
                    },
                )?;
                Ok(None)
            }
        }
    }
}

fn active_workspace(task: &Task) -> &Path {
    task.sandbox_workspace_path
        .as_deref()
        .unwrap_or(&task.workspace_path)
}

fn command_of(err: &RunnerError) -> String {
    match err {
        RunnerError::CommandNotFound { command, .. }
        | RunnerError::CommandTimeout { command, .. }
        | RunnerError::CommandFailed { command, .. } => command.clone(),
        RunnerError::ProviderLimit { .. } | RunnerError::CommandNotConfigured { .. } => String::new(),
    }
}

fn build_review_prompt(task: &Task, proposal: &str) -> String {
    format!(
        "Task: {}\n\nDescription:\n{}\n\nProposal to review:\n{}\n\nRespond with a line `VERDICT: NO_BLOCKER|BLOCKER|UNKNOWN` and a line `NEXT_ACTION: retry|pass|stop`.",
        task.title, task.description, proposal
    )
}

fn resolve_model(task: &Task, participant: &Participant) -> Option<String> {
    task.participant_models
        .get(&participant.id)
        .or_else(|| task.participant_models.get(&participant.id.to_lowercase()))
        .or_else(|| task.provider_models.get(participant.provider.as_str()))
        .cloned()
}

fn resolve_model_params(task: &Task, participant: &Participant) -> Vec<String> {
    task.participant_model_params
        .get(&participant.id)
        .or_else(|| task.participant_model_params.get(&participant.id.to_lowercase()))
        .or_else(|| task.provider_model_params.get(participant.provider.as_str()))
        .map(|raw| raw.split_whitespace().map(ToString::to_string).collect())
        .unwrap_or_default()
}

fn resolve_claude_team_agents(task: &Task, participant: &Participant) -> bool {
    task.claude_team_agents_overrides
        .get(&participant.id.to_lowercase())
        .copied()
        .unwrap_or(task.claude_team_agents)
}

fn resolve_codex_multi_agents(task: &Task, participant: &Participant) -> bool {
    task.codex_multi_agents_overrides
        .get(&participant.id.to_lowercase())
        .copied()
        .unwrap_or(task.codex_multi_agents)
}

#[cfg(test)]
#[path = "round_tests.rs"]
mod tests;
