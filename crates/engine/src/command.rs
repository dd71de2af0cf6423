// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The command executor: runs verification commands (`test_command`,
//! `lint_command`) in a task's workspace with a timeout, the same way
//! the participant runner drives provider CLIs.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// The result of running one verification command.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
    pub timed_out: bool,
}

/// Runs a shell command string in a given directory, bounded by a
/// timeout. A trait so tests can substitute a fake executor.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> CommandOutcome;
}

/// Runs commands via `sh -c <command>` (or `cmd /C` on Windows).
pub struct ShellCommandExecutor;

#[async_trait]
impl CommandExecutor for ShellCommandExecutor {
    async fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> CommandOutcome {
        let mut process = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        process
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match process.spawn() {
            Ok(child) => child,
            Err(e) => {
                return CommandOutcome {
                    success: false,
                    stdout: String::new(),
                    stderr: e.to_string(),
                    returncode: -1,
                    timed_out: false,
                }
            }
        };

        let wait = async {
            let status = child.wait().await;
            let mut stdout = String::new();
            let mut stderr = String::new();
            if let Some(mut out) = child.stdout.take() {
                let _ = out.read_to_string(&mut stdout).await;
            }
            if let Some(mut err) = child.stderr.take() {
                let _ = err.read_to_string(&mut stderr).await;
            }
            (status, stdout, stderr)
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok((Ok(status), stdout, stderr)) => CommandOutcome {
                success: status.success(),
                stdout,
                stderr,
                returncode: status.code().unwrap_or(-1),
                timed_out: false,
            },
            Ok((Err(e), stdout, stderr)) => CommandOutcome {
                success: false,
                stdout,
                stderr: format!("{stderr}\n{e}"),
                returncode: -1,
                timed_out: false,
            },
            Err(_) => {
                let _ = child.kill().await;
                CommandOutcome {
                    success: false,
                    stdout: String::new(),
                    stderr: "command timed out".to_string(),
                    returncode: -1,
                    timed_out: true,
                }
            }
        }
    }
}
