// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors the engine can raise itself. Runner/storage/artifact/fusion
//! failures that the round algorithm knows how to classify are folded
//! into a terminal task status instead of propagating; this type is for
//! failures the engine cannot recover from at all (a poisoned
//! repository, a corrupt artifact write).

use agentcheck_artifacts::ArtifactError;
use agentcheck_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("participant pool invalid: {0}")]
    InvalidParticipants(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Artifacts(#[from] ArtifactError),
}
