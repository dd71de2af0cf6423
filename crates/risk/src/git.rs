// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git helpers shared by the risk gate's HEAD-SHA check and the history
//! analyser's PR summary: reading HEAD, worktree state, and the
//! promotion guard. Every invocation runs with a 5-second timeout and
//! swallows failures into `(false, message)` rather than propagating an
//! error, since git's absence or a non-repo directory are routine.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const GIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs `git <args>` in `cwd` with a 5-second timeout. Returns
/// `(success, trimmed stdout-or-stderr)`; never propagates a process
/// error.
fn run_git(cwd: &Path, args: &[&str]) -> (bool, String) {
    let mut child = match Command::new("git")
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return (false, e.to_string()),
    };

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                use std::io::Read;
                let mut stdout = String::new();
                let mut stderr = String::new();
                if let Some(mut out) = child.stdout.take() {
                    let _ = out.read_to_string(&mut stdout);
                }
                if let Some(mut err) = child.stderr.take() {
                    let _ = err.read_to_string(&mut stderr);
                }
                let text = if status.success() { stdout } else { stderr };
                return (status.success(), text.trim().to_string());
            }
            Ok(None) => {
                if start.elapsed() >= GIT_TIMEOUT {
                    let _ = child.kill();
                    let _ = child.wait();
                    return (false, "git command timed out".to_string());
                }
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(e) => return (false, e.to_string()),
        }
    }
}

/// Read the repository's HEAD commit SHA, validating it is exactly 40
/// hex digits. Returns `None` if `cwd` isn't a git repo, git isn't
/// available, or the output doesn't look like a SHA.
pub fn read_git_head_sha(cwd: &Path) -> Option<String> {
    let (ok, output) = run_git(cwd, &["rev-parse", "HEAD"]);
    if !ok {
        return None;
    }
    let sha = output.trim().to_lowercase();
    if sha.len() == 40 && sha.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(sha)
    } else {
        None
    }
}

/// Repository state used by both the risk gate and the history
/// analyser's PR summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitState {
    pub is_repo: bool,
    pub branch: Option<String>,
    pub worktree_clean: bool,
    pub remote_origin: Option<String>,
    pub head_sha: Option<String>,
}

/// Read a repository's branch, worktree cleanliness, and `origin`
/// remote URL.
pub fn read_git_state(cwd: &Path) -> GitState {
    let head_sha = read_git_head_sha(cwd);
    if head_sha.is_none() && !cwd.join(".git").exists() {
        return GitState {
            is_repo: false,
            branch: None,
            worktree_clean: true,
            remote_origin: None,
            head_sha: None,
        };
    }

    let (branch_ok, branch_out) = run_git(cwd, &["rev-parse", "--abbrev-ref", "HEAD"]);
    let branch = branch_ok.then(|| branch_out.trim().to_string());

    let (status_ok, status_out) = run_git(cwd, &["status", "--porcelain"]);
    let worktree_clean = status_ok && status_out.trim().is_empty();

    let (remote_ok, remote_out) = run_git(cwd, &["remote", "get-url", "origin"]);
    let remote_origin = remote_ok.then(|| remote_out.trim().to_string());

    GitState {
        is_repo: true,
        branch,
        worktree_clean,
        remote_origin,
        head_sha,
    }
}

/// Environment-driven configuration for the promotion guard.
#[derive(Debug, Clone)]
pub struct PromotionGuardConfig {
    pub enabled: bool,
    pub require_clean: bool,
    pub allowed_branches: Vec<String>,
}

impl PromotionGuardConfig {
    pub fn from_env() -> Self {
        let enabled = is_truthy(std::env::var("AWE_PROMOTION_GUARD_ENABLED").ok());
        let require_clean = is_truthy(std::env::var("AWE_PROMOTION_REQUIRE_CLEAN").ok());
        let allowed_branches = std::env::var("AWE_PROMOTION_ALLOWED_BRANCHES")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            enabled,
            require_clean,
            allowed_branches,
        }
    }
}

fn is_truthy(value: Option<String>) -> bool {
    value
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// The result of evaluating the promotion guard against a merge target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionGuardResult {
    pub guard_allowed: bool,
    pub reason: String,
}

/// Evaluate whether auto-fusion may promote changes into `merge_target`.
/// Disabled guards, or non-git targets, always allow. When enabled: the
/// current branch must be in the allow-list (if one is configured), and
/// the worktree must be clean when `require_clean` is set.
pub fn evaluate_promotion_guard(
    merge_target: &Path,
    config: &PromotionGuardConfig,
) -> PromotionGuardResult {
    if !config.enabled {
        return PromotionGuardResult {
            guard_allowed: true,
            reason: "promotion guard disabled".to_string(),
        };
    }

    let state = read_git_state(merge_target);
    if !state.is_repo {
        return PromotionGuardResult {
            guard_allowed: true,
            reason: "merge target is not a git repository".to_string(),
        };
    }

    if !config.allowed_branches.is_empty() {
        let branch = state.branch.clone().unwrap_or_default();
        if !config.allowed_branches.contains(&branch) {
            return PromotionGuardResult {
                guard_allowed: false,
                reason: format!("branch '{branch}' is not in the allowed list"),
            };
        }
    }

    if config.require_clean && !state.worktree_clean {
        return PromotionGuardResult {
            guard_allowed: false,
            reason: "worktree has uncommitted changes".to_string(),
        };
    }

    PromotionGuardResult {
        guard_allowed: true,
        reason: "promotion guard satisfied".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn non_repo_reports_not_a_repo() {
        let dir = TempDir::new().expect("tempdir");
        let state = read_git_state(dir.path());
        assert!(!state.is_repo);
        assert!(state.head_sha.is_none());
    }

    #[test]
    fn disabled_guard_always_allows() {
        let dir = TempDir::new().expect("tempdir");
        let config = PromotionGuardConfig {
            enabled: false,
            require_clean: true,
            allowed_branches: vec!["main".to_string()],
        };
        let result = evaluate_promotion_guard(dir.path(), &config);
        assert!(result.guard_allowed);
    }

    #[test]
    fn non_repo_target_allows_even_when_enabled() {
        let dir = TempDir::new().expect("tempdir");
        let config = PromotionGuardConfig {
            enabled: true,
            require_clean: true,
            allowed_branches: vec![],
        };
        let result = evaluate_promotion_guard(dir.path(), &config);
        assert!(result.guard_allowed);
    }

    #[test]
    fn invalid_sha_output_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        assert!(read_git_head_sha(dir.path()).is_none());
    }
}
