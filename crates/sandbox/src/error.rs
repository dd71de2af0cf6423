// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("project path does not exist or is not a directory: {0}")]
    InvalidProjectPath(String),
    #[error("refused to bootstrap into a windows-reserved device name: {0}")]
    ReservedDeviceName(String),
}
