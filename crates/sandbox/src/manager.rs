// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bootstraps an isolated copy of a project tree for a task to run
//! against, honoring the shared ignore list and the Windows
//! reserved-device-name check.

use crate::error::SandboxError;
use crate::ignore::{is_ignored_relative_path, is_windows_reserved_name};
use chrono::Local;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// A bootstrapped sandbox directory: its path, and whether this manager
/// generated it (as opposed to an operator-supplied path).
#[derive(Debug, Clone)]
pub struct Sandbox {
    pub path: PathBuf,
    pub generated: bool,
}

/// Creates and tears down sandbox workspaces.
pub struct SandboxManager;

impl SandboxManager {
    /// Resolve the base directory new sandboxes are created under, per
    /// the environment precedence:
    /// `AWE_SANDBOX_BASE` if set; else, if `AWE_SANDBOX_USE_PUBLIC_BASE`
    /// is truthy, a shared platform-public temp root; else
    /// `$HOME/.awe-agentcheck/sandboxes`.
    pub fn default_base() -> PathBuf {
        if let Ok(base) = std::env::var("AWE_SANDBOX_BASE") {
            if !base.trim().is_empty() {
                return PathBuf::from(base);
            }
        }
        if is_truthy_env("AWE_SANDBOX_USE_PUBLIC_BASE") {
            return public_base();
        }
        home_dir().join(".awe-agentcheck").join("sandboxes")
    }

    /// Generate a fresh sandbox path under `base`:
    /// `<base>/<project_name>-lab/<YYYYmmdd-HHMMSS>-<6 hex chars>`.
    pub fn generate_path(base: &Path, project_name: &str) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
        let suffix = random_hex(6);
        base.join(format!("{project_name}-lab"))
            .join(format!("{stamp}-{suffix}"))
    }

    /// Bootstraps `sandbox_path` from `project_path`: creates the
    /// directory and recursively copies the project tree, applying the
    /// shared ignore list and rejecting Windows-reserved leaf names.
    pub fn bootstrap(project_path: &Path, sandbox_path: &Path) -> Result<(), SandboxError> {
        if !project_path.is_dir() {
            return Err(SandboxError::InvalidProjectPath(
                project_path.display().to_string(),
            ));
        }
        fs::create_dir_all(sandbox_path)?;

        for entry in WalkDir::new(project_path)
            .into_iter()
            .filter_entry(|e| {
                let rel = e.path().strip_prefix(project_path).unwrap_or(e.path());
                rel.as_os_str().is_empty() || !is_ignored_relative_path(rel)
            })
        {
            let entry = entry.map_err(|e| {
                SandboxError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "walk error")
                }))
            })?;
            let rel = entry.path().strip_prefix(project_path).unwrap_or(entry.path());
            if rel.as_os_str().is_empty() {
                continue;
            }
            if let Some(leaf) = rel.file_name().and_then(|n| n.to_str()) {
                if cfg!(windows) && is_windows_reserved_name(leaf) {
                    warn!(leaf, "skipping windows-reserved device name during bootstrap");
                    continue;
                }
            }

            let target = sandbox_path.join(rel);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
            } else if entry.file_type().is_file() {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(entry.path(), &target)?;
            }
        }

        info!(
            project = %project_path.display(),
            sandbox = %sandbox_path.display(),
            "bootstrapped sandbox workspace"
        );
        Ok(())
    }

    /// Creates a generated sandbox: resolves the default base, generates
    /// a fresh path, and bootstraps it. Returns `generated=true`.
    pub fn create_generated(project_path: &Path, project_name: &str) -> Result<Sandbox, SandboxError> {
        let base = Self::default_base();
        let path = Self::generate_path(&base, project_name);
        Self::bootstrap(project_path, &path)?;
        Ok(Sandbox {
            path,
            generated: true,
        })
    }

    /// Adopts an operator-supplied sandbox path, bootstrapping it if it
    /// doesn't already exist. Returns `generated=false`.
    pub fn adopt_explicit(project_path: &Path, sandbox_path: &Path) -> Result<Sandbox, SandboxError> {
        Self::bootstrap(project_path, sandbox_path)?;
        Ok(Sandbox {
            path: sandbox_path.to_path_buf(),
            generated: false,
        })
    }

    /// Removes a sandbox directory only if it was generated by this
    /// manager; an operator-supplied sandbox is never deleted.
    pub fn remove_if_generated(sandbox: &Sandbox) -> Result<(), SandboxError> {
        if !sandbox.generated {
            return Ok(());
        }
        if sandbox.path.exists() {
            fs::remove_dir_all(&sandbox.path)?;
        }
        Ok(())
    }
}

fn is_truthy_env(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

fn public_base() -> PathBuf {
    if cfg!(windows) {
        let public = std::env::var("PUBLIC").unwrap_or_else(|_| "C:\\Users\\Public".to_string());
        PathBuf::from(public).join("awe-agentcheck-sandboxes")
    } else {
        PathBuf::from("/tmp/awe-agentcheck-sandboxes")
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn random_hex(n: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| std::char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect()
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
