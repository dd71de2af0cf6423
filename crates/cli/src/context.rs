// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires a repository, artifact store, and task service from
//! [`ServiceConfig`], the way `daemon::lifecycle` wires the teacher's
//! long-lived state from its own env-driven config.

use agentcheck_artifacts::ArtifactStore;
use agentcheck_engine::{CommandExecutor, EngineConfig, ShellCommandExecutor, WorkflowEngine};
use agentcheck_runner::ParticipantRunner;
use agentcheck_service::{ServiceConfig, TaskService};
use agentcheck_storage::{InMemoryTaskRepository, SqliteTaskRepository, TaskRepository};
use std::sync::Arc;

pub struct CliContext {
    pub config: ServiceConfig,
    pub repository: Arc<dyn TaskRepository>,
    pub artifacts: Arc<ArtifactStore>,
}

impl CliContext {
    pub fn load() -> anyhow::Result<Self> {
        let config = ServiceConfig::from_env()?;
        let repository: Arc<dyn TaskRepository> = match &config.database_url {
            Some(path) => Arc::new(SqliteTaskRepository::open(std::path::Path::new(path))?),
            None => Arc::new(InMemoryTaskRepository::new()),
        };
        let artifacts = Arc::new(ArtifactStore::new(config.artifact_root.clone()));
        Ok(Self {
            config,
            repository,
            artifacts,
        })
    }

    pub fn service(&self) -> TaskService {
        TaskService::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.artifacts),
            self.config.max_concurrent_running_tasks,
        )
    }

    pub fn engine(&self) -> WorkflowEngine {
        let runner = Arc::new(ParticipantRunner::new(self.config.dry_run));
        let executor: Arc<dyn CommandExecutor> = Arc::new(ShellCommandExecutor);
        let engine_config = EngineConfig {
            participant_timeout: self.config.participant_timeout,
            participant_timeout_retries: self.config.participant_timeout_retries,
            command_timeout: self.config.command_timeout,
            ..EngineConfig::default()
        };
        WorkflowEngine::new(
            Arc::clone(&self.repository),
            runner,
            executor,
            Some(Arc::clone(&self.artifacts)),
            engine_config,
        )
    }
}
