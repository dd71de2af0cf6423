// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task-creation request: raw, caller-supplied fields validated and
//! normalized into a [`Task`] before it ever reaches the engine.

use crate::error::ServiceError;
use agentcheck_core::{
    parse_participant_id, Provider, RepairMode, Task, TaskId, TaskStatus, WorkspaceFingerprint,
    SUPPORTED_PROVIDERS,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Raw fields a caller supplies to create a task. Every field that maps
/// 1:1 onto [`Task`] keeps the same name.
#[derive(Debug, Clone, Default)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,

    pub author_participant: String,
    pub reviewer_participants: Vec<String>,

    pub project_path: Option<PathBuf>,
    pub workspace_path: PathBuf,
    pub sandbox_mode: bool,
    pub sandbox_path: Option<PathBuf>,
    pub sandbox_cleanup_on_pass: bool,

    pub test_command: Option<String>,
    pub lint_command: Option<String>,

    pub max_rounds: u32,
    pub self_loop_mode: bool,
    pub auto_merge: bool,
    pub merge_target_path: Option<PathBuf>,
    pub repair_mode: String,
    pub debate_mode: bool,
    pub plain_mode: bool,
    pub stream_mode: bool,
    pub evolution_level: u8,
    pub evolve_until: Option<String>,
    pub conversation_language: String,

    pub provider_models: BTreeMap<String, String>,
    pub provider_model_params: BTreeMap<String, String>,
    pub participant_models: BTreeMap<String, String>,
    pub participant_model_params: BTreeMap<String, String>,
    pub claude_team_agents: bool,
    pub codex_multi_agents: bool,
    pub claude_team_agents_overrides: BTreeMap<String, String>,
    pub codex_multi_agents_overrides: BTreeMap<String, String>,
}

/// Whether the explicit sandbox request was normalized away by the
/// multi-round-manual-promote rule, so the caller knows a requested
/// sandbox path was dropped.
pub struct NormalizedRequest {
    pub task: Task,
    pub requested_sandbox_path: Option<PathBuf>,
}

const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("en", "en"),
    ("english", "en"),
    ("eng", "en"),
    ("zh", "zh"),
    ("zh-cn", "zh"),
    ("cn", "zh"),
    ("chinese", "zh"),
    ("中文", "zh"),
];

fn canonicalize_language(raw: &str) -> Result<String, ServiceError> {
    let lowered = raw.trim().to_lowercase();
    LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| canonical.to_string())
        .ok_or_else(|| {
            ServiceError::validation("conversation_language", format!("unsupported language: {raw}"))
        })
}

fn parse_repair_mode(raw: &str) -> Result<RepairMode, ServiceError> {
    match raw.trim().to_lowercase().as_str() {
        "minimal" => Ok(RepairMode::Minimal),
        "balanced" => Ok(RepairMode::Balanced),
        "structural" => Ok(RepairMode::Structural),
        other => Err(ServiceError::validation(
            "repair_mode",
            format!("must be one of minimal, balanced, structural; got '{other}'"),
        )),
    }
}

fn parse_evolve_until(raw: &str) -> Result<DateTime<Utc>, ServiceError> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(zero_nanos(dt.with_timezone(&Utc)));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(zero_nanos(Utc.from_utc_datetime(&naive)));
        }
    }

    let swapped = if trimmed.contains('T') {
        trimmed.replacen('T', " ", 1)
    } else {
        trimmed.replacen(' ', "T", 1)
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&swapped) {
        return Ok(zero_nanos(dt.with_timezone(&Utc)));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&swapped, fmt) {
            return Ok(zero_nanos(Utc.from_utc_datetime(&naive)));
        }
    }

    Err(ServiceError::validation(
        "evolve_until",
        format!("could not parse datetime: {raw}"),
    ))
}

fn zero_nanos(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

fn coerce_bool_like(raw: &str, field: &str) -> Result<bool, ServiceError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ServiceError::validation(
            field,
            format!("'{other}' is not a recognized boolean"),
        )),
    }
}

impl CreateTaskRequest {
    /// Validate and normalize this request into a [`Task`], applying
    /// every task-creation rule plus the service-layer supplements.
    /// Does not touch the filesystem, the repository, or the sandbox —
    /// callers perform those side effects afterward.
    pub fn validate(mut self, id: &str) -> Result<NormalizedRequest, ServiceError> {
        let author = parse_participant_id(&self.author_participant)
            .map_err(|e| ServiceError::validation("author_participant", e))?;

        let mut reviewers = Vec::with_capacity(self.reviewer_participants.len());
        for (i, raw) in self.reviewer_participants.iter().enumerate() {
            let parsed = parse_participant_id(raw)
                .map_err(|e| ServiceError::validation(format!("reviewer_participants[{i}]"), e))?;
            reviewers.push(parsed);
        }

        if !self.workspace_path.is_dir() {
            return Err(ServiceError::validation(
                "workspace_path",
                format!("'{}' does not exist or is not a directory", self.workspace_path.display()),
            ));
        }

        if !(1..=20).contains(&self.max_rounds) {
            return Err(ServiceError::validation(
                "max_rounds",
                format!("must be in [1, 20]; got {}", self.max_rounds),
            ));
        }
        if self.evolution_level > 2 {
            return Err(ServiceError::validation(
                "evolution_level",
                format!("must be in [0, 2]; got {}", self.evolution_level),
            ));
        }

        let repair_mode = parse_repair_mode(&self.repair_mode)?;
        let conversation_language = canonicalize_language(&self.conversation_language)?;
        let evolve_until = self
            .evolve_until
            .as_deref()
            .map(parse_evolve_until)
            .transpose()?;

        let project_path = self.project_path.clone().unwrap_or_else(|| self.workspace_path.clone());

        let mut alias_set: std::collections::HashSet<String> =
            reviewers.iter().map(|p| p.id.to_lowercase()).collect();
        alias_set.insert(author.id.to_lowercase());

        for (provider, value) in &self.provider_models {
            validate_provider_key(provider, "provider_models")?;
            validate_nonempty(value, "provider_models")?;
        }
        for (provider, value) in &self.provider_model_params {
            validate_provider_key(provider, "provider_model_params")?;
            validate_nonempty(value, "provider_model_params")?;
        }

        let participant_models = normalize_participant_map(
            &self.participant_models,
            &alias_set,
            "participant_models",
        )?;
        let participant_model_params = normalize_participant_map(
            &self.participant_model_params,
            &alias_set,
            "participant_model_params",
        )?;

        let claude_team_agents_overrides = normalize_provider_overrides(
            &self.claude_team_agents_overrides,
            &author,
            &reviewers,
            Provider::Claude,
            "claude_team_agents_overrides",
        )?;
        let codex_multi_agents_overrides = normalize_provider_overrides(
            &self.codex_multi_agents_overrides,
            &author,
            &reviewers,
            Provider::Codex,
            "codex_multi_agents_overrides",
        )?;

        let multi_round_manual_promote = self.max_rounds > 1 && !self.auto_merge;
        let requested_sandbox_path = self.sandbox_path.take();
        let mut sandbox_mode = self.sandbox_mode;
        let mut sandbox_path = requested_sandbox_path.clone();
        if multi_round_manual_promote {
            sandbox_mode = true;
            sandbox_path = None;
        }

        let mut merge_target_path = self.merge_target_path.clone();
        if self.auto_merge && sandbox_mode && merge_target_path.is_none() {
            merge_target_path = Some(project_path.clone());
        }

        let now = Utc::now();
        let task = Task {
            task_id: TaskId::new(id),
            title: self.title,
            description: self.description,
            status: TaskStatus::Queued,
            author_participant: format!("{}#{}", author.provider, author.id),
            reviewer_participants: reviewers
                .iter()
                .map(|p| format!("{}#{}", p.provider, p.id))
                .collect(),
            project_path: project_path.clone(),
            workspace_path: self.workspace_path.clone(),
            sandbox_workspace_path: None,
            workspace_fingerprint: Some(WorkspaceFingerprint::default()),
            test_command: self.test_command,
            lint_command: self.lint_command,
            max_rounds: self.max_rounds,
            self_loop_mode: self.self_loop_mode,
            auto_merge: self.auto_merge,
            merge_target_path,
            repair_mode,
            debate_mode: self.debate_mode,
            plain_mode: self.plain_mode,
            stream_mode: self.stream_mode,
            sandbox_mode,
            sandbox_generated: false,
            sandbox_cleanup_on_pass: self.sandbox_cleanup_on_pass,
            evolution_level: self.evolution_level,
            evolve_until,
            conversation_language,
            provider_models: self.provider_models,
            provider_model_params: self.provider_model_params,
            participant_models,
            participant_model_params,
            claude_team_agents: self.claude_team_agents,
            codex_multi_agents: self.codex_multi_agents,
            claude_team_agents_overrides,
            codex_multi_agents_overrides,
            rounds_completed: 0,
            cancel_requested: false,
            last_gate_reason: None,
            created_at: now,
            updated_at: now,
        };

        Ok(NormalizedRequest {
            task,
            requested_sandbox_path: sandbox_path,
        })
    }
}

fn validate_provider_key(key: &str, field: &str) -> Result<(), ServiceError> {
    Provider::from_str(key)
        .map(|_| ())
        .map_err(|_| ServiceError::validation(field, format!("'{key}' is not a supported provider")))
}

fn validate_nonempty(value: &str, field: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(field, "value must not be empty"));
    }
    Ok(())
}

fn normalize_participant_map(
    raw: &BTreeMap<String, String>,
    alias_set: &std::collections::HashSet<String>,
    field: &str,
) -> Result<BTreeMap<String, String>, ServiceError> {
    let mut normalized = BTreeMap::new();
    for (key, value) in raw {
        if !alias_set.contains(&key.to_lowercase()) {
            return Err(ServiceError::validation(
                field,
                format!("'{key}' does not match any participant in this task"),
            ));
        }
        normalized.insert(key.clone(), value.clone());
        normalized.insert(key.to_lowercase(), value.clone());
    }
    Ok(normalized)
}

#[allow(clippy::too_many_arguments)]
fn normalize_provider_overrides(
    raw: &BTreeMap<String, String>,
    author: &agentcheck_core::Participant,
    reviewers: &[agentcheck_core::Participant],
    required_provider: Provider,
    field: &str,
) -> Result<BTreeMap<String, bool>, ServiceError> {
    let mut normalized = BTreeMap::new();
    for (key, value) in raw {
        let lowered = key.to_lowercase();
        let matching = std::iter::once(author)
            .chain(reviewers.iter())
            .find(|p| p.id.to_lowercase() == lowered);
        let Some(participant) = matching else {
            return Err(ServiceError::validation(
                field,
                format!("'{key}' does not match any participant in this task"),
            ));
        };
        if participant.provider != required_provider {
            return Err(ServiceError::validation(
                field,
                format!("'{key}' is a {} participant, not {required_provider}", participant.provider),
            ));
        }
        normalized.insert(lowered, coerce_bool_like(value, field)?);
    }
    Ok(normalized)
}
