// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime error classes surfaced by the participant runner. Upstream
//! (the workflow engine) matches on `reason_class()` to decide
//! retry/fallback, so the string form must stay stable.

use thiserror::Error;

/// Runtime errors the runner can raise for one participant invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunnerError {
    #[error("provider_limit provider={provider}")]
    ProviderLimit { provider: String },

    #[error("command_not_found provider={provider} command={command}")]
    CommandNotFound { provider: String, command: String },

    #[error("command_timeout provider={provider} command={command}")]
    CommandTimeout { provider: String, command: String },

    #[error("command_not_configured provider={provider}")]
    CommandNotConfigured { provider: String },

    #[error("command_failed provider={provider} command={command} returncode={returncode}")]
    CommandFailed {
        provider: String,
        command: String,
        returncode: i32,
    },
}

impl RunnerError {
    /// The stable `reason` class string downstream fallback matchers key
    /// off of (e.g. `"provider_limit"`, `"command_timeout"`).
    pub fn reason_class(&self) -> &'static str {
        match self {
            RunnerError::ProviderLimit { .. } => "provider_limit",
            RunnerError::CommandNotFound { .. } => "command_not_found",
            RunnerError::CommandTimeout { .. } => "command_timeout",
            RunnerError::CommandNotConfigured { .. } => "command_not_configured",
            RunnerError::CommandFailed { .. } => "command_failed",
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            RunnerError::ProviderLimit { provider }
            | RunnerError::CommandNotFound { provider, .. }
            | RunnerError::CommandTimeout { provider, .. }
            | RunnerError::CommandNotConfigured { provider }
            | RunnerError::CommandFailed { provider, .. } => provider,
        }
    }
}
