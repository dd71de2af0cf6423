// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-driven configuration, read once at process startup and
//! centralized the way `daemon::lifecycle::Config` centralizes env reads.

use std::path::PathBuf;
use std::time::Duration;

/// Process-wide configuration sourced from `AWE_*` environment
/// variables, with documented defaults.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// `AWE_DATABASE_URL`. `None` selects the in-memory repository.
    pub database_url: Option<String>,
    /// `AWE_ARTIFACT_ROOT`, default `./artifacts`.
    pub artifact_root: PathBuf,
    /// `AWE_SERVICE_NAME`, default `agentcheck`.
    pub service_name: String,
    /// `AWE_OTEL_EXPORTER_OTLP_ENDPOINT`.
    pub otel_endpoint: Option<String>,
    /// `AWE_DRY_RUN`, default `false`.
    pub dry_run: bool,
    /// `AWE_PARTICIPANT_TIMEOUT_SECONDS`, default `900`.
    pub participant_timeout: Duration,
    /// `AWE_COMMAND_TIMEOUT_SECONDS`, default `600`.
    pub command_timeout: Duration,
    /// `AWE_PARTICIPANT_TIMEOUT_RETRIES`, default `1`.
    pub participant_timeout_retries: u32,
    /// `AWE_MAX_CONCURRENT_RUNNING_TASKS`, default `4`.
    pub max_concurrent_running_tasks: usize,
    /// `AWE_WORKFLOW_BACKEND`, default `classic`. One of `classic`,
    /// `langgraph` — only `classic` behavior is implemented; the knob is
    /// accepted and validated for forward compatibility.
    pub workflow_backend: String,
}

/// `AWE_WORKFLOW_BACKEND` was set to a value that isn't one of the two
/// recognized backends.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized AWE_WORKFLOW_BACKEND '{0}'; expected 'classic' or 'langgraph'")]
pub struct UnrecognizedWorkflowBackend(pub String);

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            artifact_root: PathBuf::from("./artifacts"),
            service_name: "agentcheck".to_string(),
            otel_endpoint: None,
            dry_run: false,
            participant_timeout: Duration::from_secs(900),
            command_timeout: Duration::from_secs(600),
            participant_timeout_retries: 1,
            max_concurrent_running_tasks: 4,
            workflow_backend: "classic".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Reads every `AWE_*` environment variable, falling back to
    /// documented defaults. Returns an error only when
    /// `AWE_WORKFLOW_BACKEND` names an unrecognized backend — every other
    /// variable degrades to its default rather than failing startup.
    pub fn from_env() -> Result<Self, UnrecognizedWorkflowBackend> {
        let defaults = Self::default();
        let workflow_backend =
            env_string("AWE_WORKFLOW_BACKEND").unwrap_or(defaults.workflow_backend);
        if !matches!(workflow_backend.as_str(), "classic" | "langgraph") {
            return Err(UnrecognizedWorkflowBackend(workflow_backend));
        }
        Ok(Self {
            database_url: env_string("AWE_DATABASE_URL"),
            artifact_root: env_string("AWE_ARTIFACT_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_root),
            service_name: env_string("AWE_SERVICE_NAME").unwrap_or(defaults.service_name),
            otel_endpoint: env_string("AWE_OTEL_EXPORTER_OTLP_ENDPOINT"),
            dry_run: env_bool("AWE_DRY_RUN", defaults.dry_run),
            participant_timeout: env_duration_secs(
                "AWE_PARTICIPANT_TIMEOUT_SECONDS",
                defaults.participant_timeout,
            ),
            command_timeout: env_duration_secs("AWE_COMMAND_TIMEOUT_SECONDS", defaults.command_timeout),
            participant_timeout_retries: env_u32(
                "AWE_PARTICIPANT_TIMEOUT_RETRIES",
                defaults.participant_timeout_retries,
            ),
            max_concurrent_running_tasks: env_usize(
                "AWE_MAX_CONCURRENT_RUNNING_TASKS",
                defaults.max_concurrent_running_tasks,
            ),
            workflow_backend,
        })
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_bool(name: &str, default: bool) -> bool {
    env_string(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env_string(name).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env_string(name).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_duration_secs(name: &str, default: Duration) -> Duration {
    env_string(name)
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_apply_when_env_unset() {
        for key in [
            "AWE_DATABASE_URL",
            "AWE_ARTIFACT_ROOT",
            "AWE_SERVICE_NAME",
            "AWE_DRY_RUN",
            "AWE_MAX_CONCURRENT_RUNNING_TASKS",
        ] {
            std::env::remove_var(key);
        }
        let config = ServiceConfig::from_env().expect("valid config");
        assert_eq!(config.service_name, "agentcheck");
        assert_eq!(config.max_concurrent_running_tasks, 4);
        assert!(!config.dry_run);
    }

    #[test]
    #[serial]
    fn unrecognized_workflow_backend_is_rejected() {
        std::env::set_var("AWE_WORKFLOW_BACKEND", "legacy");
        let result = ServiceConfig::from_env();
        std::env::remove_var("AWE_WORKFLOW_BACKEND");
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn reads_overrides_from_env() {
        std::env::set_var("AWE_SERVICE_NAME", "my-service");
        std::env::set_var("AWE_MAX_CONCURRENT_RUNNING_TASKS", "10");
        std::env::set_var("AWE_DRY_RUN", "true");
        let config = ServiceConfig::from_env().expect("valid config");
        assert_eq!(config.service_name, "my-service");
        assert_eq!(config.max_concurrent_running_tasks, 10);
        assert!(config.dry_run);
        std::env::remove_var("AWE_SERVICE_NAME");
        std::env::remove_var("AWE_MAX_CONCURRENT_RUNNING_TASKS");
        std::env::remove_var("AWE_DRY_RUN");
    }
}
