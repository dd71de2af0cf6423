// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The preflight risk gate: scores a workspace, resolves its
//! tier-dependent checklist, and evaluates each check against runtime
//! facts before a task is admitted to run.

use crate::contract::load_contract;
use crate::git::read_git_head_sha;
use crate::profile::{compute_profile, resolve_risk_tier, RepoProfile, RiskTier};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

fn ui_concern_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(ui|frontend|browser|page|screen|dashboard|web)\b").expect("valid regex")
    })
}

/// The facts the preflight gate needs about the task and its workspace.
pub struct PreflightInput<'a> {
    pub task_title: &'a str,
    pub task_description: &'a str,
    pub project_root: &'a Path,
    pub test_command: Option<&'a str>,
    pub lint_command: Option<&'a str>,
    pub reviewer_count: usize,
}

/// The gate's verdict for one task, plus enough detail for the caller to
/// present it to an operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightResult {
    pub passed: bool,
    pub reason: String,
    pub risk_tier: RiskTier,
    pub required_checks: Vec<String>,
    pub failed_checks: Vec<String>,
    pub profile: RepoProfile,
    pub contract_version: String,
    pub head_sha: Option<String>,
}

/// Checks evaluated regardless of the tier's required-checks list.
const ALWAYS_EVALUATED: &[&str] = &[
    "reviewers_present",
    "test_command_present",
    "lint_command_present",
];

fn mentions_browser_tooling(command: Option<&str>) -> bool {
    command
        .map(|c| {
            let lower = c.to_lowercase();
            lower.contains("playwright") || lower.contains("browser")
        })
        .unwrap_or(false)
}

fn check_passes(name: &str, input: &PreflightInput, is_git_repo: bool, head_sha: &Option<String>) -> bool {
    match name {
        "risk-policy-gate" | "evidence-manifest" => true,
        "harness-smoke" | "ci-pipeline" => input.test_command.is_some() && input.lint_command.is_some(),
        "head-sha-gate" | "review-head-sha-gate" => !is_git_repo || head_sha.is_some(),
        "browser evidence" => {
            let ui_concern = ui_concern_regex().is_match(input.task_title)
                || ui_concern_regex().is_match(input.task_description);
            !ui_concern || mentions_browser_tooling(input.test_command)
        }
        "reviewers_present" => input.reviewer_count > 0,
        "test_command_present" => input.test_command.is_some(),
        "lint_command_present" => input.lint_command.is_some(),
        _ => true,
    }
}

/// Evaluate the preflight risk gate for a task against its project root.
pub fn evaluate_preflight(input: &PreflightInput) -> PreflightResult {
    let profile = compute_profile(input.project_root);
    let risk_tier = resolve_risk_tier(&profile);
    let contract = load_contract(input.project_root);
    let required_checks = contract.required_checks(risk_tier);

    let is_git_repo = input.project_root.join(".git").exists();
    let head_sha = if is_git_repo {
        read_git_head_sha(input.project_root)
    } else {
        None
    };

    let mut evaluated: Vec<String> = required_checks.clone();
    for extra in ALWAYS_EVALUATED {
        if !evaluated.iter().any(|c| c == extra) {
            evaluated.push(extra.to_string());
        }
    }

    let failed_checks: Vec<String> = evaluated
        .iter()
        .filter(|check| !check_passes(check, input, is_git_repo, &head_sha))
        .cloned()
        .collect();

    let passed = failed_checks.is_empty();
    let reason = if passed {
        "passed".to_string()
    } else {
        format!("failed checks: {}", failed_checks.join(", "))
    };

    PreflightResult {
        passed,
        reason,
        risk_tier,
        required_checks,
        failed_checks,
        profile,
        contract_version: contract.version,
        head_sha,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("lib.rs"), "fn lib() {}").expect("writes");
        dir
    }

    #[test]
    fn low_risk_project_with_full_facts_passes() {
        let dir = project();
        let input = PreflightInput {
            task_title: "fix a typo",
            task_description: "small change",
            project_root: dir.path(),
            test_command: Some("cargo test".to_string()).as_deref(),
            lint_command: Some("cargo clippy".to_string()).as_deref(),
            reviewer_count: 1,
        };
        let result = evaluate_preflight(&input);
        assert!(result.passed, "reason: {}", result.reason);
        assert_eq!(result.risk_tier, RiskTier::Low);
    }

    #[test]
    fn missing_reviewers_fails_the_gate() {
        let dir = project();
        let input = PreflightInput {
            task_title: "fix a typo",
            task_description: "small change",
            project_root: dir.path(),
            test_command: Some("cargo test").as_deref(),
            lint_command: Some("cargo clippy").as_deref(),
            reviewer_count: 0,
        };
        let result = evaluate_preflight(&input);
        assert!(!result.passed);
        assert!(result.failed_checks.contains(&"reviewers_present".to_string()));
    }

    #[test]
    fn ui_concern_without_browser_test_fails_browser_evidence_when_required() {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir_all(dir.path().join("ops")).expect("creates");
        let mut checks_by_tier = std::collections::BTreeMap::new();
        checks_by_tier.insert("low".to_string(), vec!["browser evidence".to_string()]);
        let contract = crate::contract::RiskPolicyContract {
            version: "v1".to_string(),
            source: "ignored".to_string(),
            checks_by_tier,
        };
        fs::write(
            dir.path().join("ops/risk_policy_contract.json"),
            serde_json::to_string(&contract).expect("serializes"),
        )
        .expect("writes");

        let input = PreflightInput {
            task_title: "redesign the dashboard UI",
            task_description: "update the frontend",
            project_root: dir.path(),
            test_command: Some("cargo test").as_deref(),
            lint_command: Some("cargo clippy").as_deref(),
            reviewer_count: 1,
        };
        let result = evaluate_preflight(&input);
        assert!(result.failed_checks.contains(&"browser evidence".to_string()));
    }

    #[test]
    fn non_git_project_passes_head_sha_gate() {
        let dir = project();
        let input = PreflightInput {
            task_title: "task",
            task_description: "desc",
            project_root: dir.path(),
            test_command: Some("cargo test").as_deref(),
            lint_command: Some("cargo clippy").as_deref(),
            reviewer_count: 1,
        };
        let result = evaluate_preflight(&input);
        assert!(!result.failed_checks.contains(&"head-sha-gate".to_string()));
    }
}
