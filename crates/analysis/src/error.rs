// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by the analyser.

use agentcheck_artifacts::ArtifactError;
use agentcheck_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}
