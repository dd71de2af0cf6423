// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Participant-pool fallback policy: the predicates the overnight
//! driver uses to decide when to switch from the primary author/
//! reviewer pool to a fallback pool, and back again.

/// A named author/reviewer pool the driver can assign to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantPool {
    pub name: String,
    pub author: String,
    pub reviewers: Vec<String>,
}

impl ParticipantPool {
    pub fn new(name: impl Into<String>, author: impl Into<String>, reviewers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            reviewers,
        }
    }
}

/// `status="failed_system"` and the reason mentions `claude` or
/// `command failed` — the driver falls back to its secondary pool.
pub fn should_switch_to_fallback(status: &str, reason: Option<&str>) -> bool {
    let status = status.trim().to_lowercase();
    let reason = reason.unwrap_or_default().trim().to_lowercase();
    if status != "failed_system" {
        return false;
    }
    reason.contains("claude") || reason.contains("command failed")
}

/// `status="failed_system"` and the reason names `provider=codex` with
/// one of the transient codex failure classes — the driver switches
/// back to its primary pool.
pub fn should_switch_back_to_primary(status: &str, reason: Option<&str>) -> bool {
    let status = status.trim().to_lowercase();
    let reason = reason.unwrap_or_default().trim().to_lowercase();
    if status != "failed_system" {
        return false;
    }
    reason.contains("provider=codex")
        && (reason.contains("command_timeout")
            || reason.contains("command_not_found")
            || reason.contains("provider_limit"))
}

/// Whether `reason` names a provider-limit runtime error, optionally
/// scoped to a specific `provider`.
pub fn is_provider_limit_reason(reason: Option<&str>, provider: Option<&str>) -> bool {
    let text = reason.unwrap_or_default().trim().to_lowercase();
    if !text.contains("provider_limit") {
        return false;
    }
    match provider {
        Some(p) => text.contains(&format!("provider={}", p.trim().to_lowercase())),
        None => true,
    }
}

/// `status="queued"` and the reason names `concurrency_limit` — the
/// driver should re-issue a start request for this task.
pub fn should_retry_start_for_concurrency_limit(status: &str, reason: Option<&str>) -> bool {
    let status = status.trim().to_lowercase();
    let reason = reason.unwrap_or_default().trim().to_lowercase();
    status == "queued" && reason.contains("concurrency_limit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switches_to_fallback_on_claude_failure() {
        assert!(should_switch_to_fallback(
            "failed_system",
            Some("workflow_error: command_failed provider=claude command=claude")
        ));
    }

    #[test]
    fn switches_to_fallback_on_generic_command_failed() {
        assert!(should_switch_to_fallback(
            "failed_system",
            Some("command failed unexpectedly")
        ));
    }

    #[test]
    fn does_not_switch_to_fallback_on_other_status() {
        assert!(!should_switch_to_fallback("failed_gate", Some("claude blew up")));
    }

    #[test]
    fn switches_back_on_transient_codex_failure() {
        assert!(should_switch_back_to_primary(
            "failed_system",
            Some("workflow_error: command_timeout provider=codex command=codex")
        ));
    }

    #[test]
    fn does_not_switch_back_on_codex_command_failed() {
        assert!(!should_switch_back_to_primary(
            "failed_system",
            Some("workflow_error: command_failed provider=codex command=codex returncode=1")
        ));
    }

    #[test]
    fn provider_limit_detection_is_scoped_when_requested() {
        let reason = Some("workflow_error: provider_limit provider=claude command=");
        assert!(is_provider_limit_reason(reason, Some("claude")));
        assert!(!is_provider_limit_reason(reason, Some("codex")));
        assert!(is_provider_limit_reason(reason, None));
    }

    #[test]
    fn concurrency_limit_retry_requires_queued_status() {
        assert!(should_retry_start_for_concurrency_limit(
            "queued",
            Some("concurrency_limit")
        ));
        assert!(!should_retry_start_for_concurrency_limit(
            "running",
            Some("concurrency_limit")
        ));
    }
}
