// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors the automation driver can raise itself.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("lock already held by pid={0}")]
    LockHeld(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Storage(#[from] agentcheck_storage::StorageError),
}
