// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output classification: provider-limit detection and the
//! `VERDICT:`/`NEXT_ACTION:` directive parser.

use agentcheck_core::ReviewVerdict;
use regex::Regex;
use std::sync::OnceLock;

/// Substrings (case-insensitive) that mark output as a provider refusing
/// to continue due to quota/rate/capacity limits.
const LIMIT_PATTERNS: &[&str] = &[
    "hit your limit",
    "usage limit",
    "rate limit",
    "quota exceeded",
    "ratelimitexceeded",
    "resource_exhausted",
    "model_capacity_exhausted",
    "no capacity available",
    "insufficient_quota",
];

/// Whether `output` matches any of the known provider-limit substrings.
pub fn is_provider_limit_output(output: &str) -> bool {
    if output.trim().is_empty() {
        return false;
    }
    let lowered = output.to_lowercase();
    LIMIT_PATTERNS.iter().any(|p| lowered.contains(p))
}

fn verdict_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^\s*VERDICT:\s*(NO_BLOCKER|BLOCKER|UNKNOWN)\s*$").expect("valid regex")
    })
}

fn next_action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^\s*NEXT_ACTION:\s*(retry|pass|stop)\s*$").expect("valid regex")
    })
}

/// Parse the first `VERDICT: ...` line in `output`, top-to-bottom.
/// Defaults to [`ReviewVerdict::Unknown`] when no line matches.
pub fn parse_verdict(output: &str) -> ReviewVerdict {
    match verdict_regex()
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_uppercase())
        .as_deref()
    {
        Some("NO_BLOCKER") => ReviewVerdict::NoBlocker,
        Some("BLOCKER") => ReviewVerdict::Blocker,
        _ => ReviewVerdict::Unknown,
    }
}

/// Parse the first `NEXT_ACTION: ...` line in `output`, top-to-bottom.
pub fn parse_next_action(output: &str) -> Option<String> {
    next_action_regex()
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
}
