// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service-level errors. Validation errors always carry a `field`
//! pointer so callers (a CLI, an HTTP handler) can report precisely
//! which input was wrong; they never reach the engine.

use agentcheck_artifacts::ArtifactError;
use agentcheck_sandbox::SandboxError;
use agentcheck_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed for field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Artifacts(#[from] ArtifactError),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

impl ServiceError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The field pointer for validation errors, if this is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ServiceError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}
