// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository risk profiling: file count, risk-token markers, and size
//! bucket, collapsed into a coarse risk level and risk tier.

use agentcheck_sandbox::is_ignored_relative_path;
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

const SCAN_LIMIT: usize = 5000;
const SMALL_MAX_FILES: usize = 120;
const MEDIUM_MAX_FILES: usize = 1200;

const RISK_TOKENS: &[&str] = &[
    "prod",
    "deploy",
    "k8s",
    "terraform",
    "helm",
    "security",
    "auth",
    "payment",
    "migrations",
    "migration",
    "database",
    "db",
];

const RISK_EXTENSIONS: &[&str] = &[".sql", ".tf", ".yaml", ".yml"];
const RISK_EXTENSION_STEMS: &[&str] = &["prod", "deploy", "migration", "schema", "security"];

/// Coarse repository size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
}

/// The finer-grained risk level, before collapsing to [`RiskTier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// The coarse tier the preflight gate keys its checklist on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    High,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Low => write!(f, "low"),
            RiskTier::High => write!(f, "high"),
        }
    }
}

/// A repository risk profile computed by scanning the project tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoProfile {
    pub file_count: usize,
    pub risk_markers: usize,
    pub size_bucket: SizeBucket,
    pub scan_truncated: bool,
}

fn path_has_risk_marker(relative: &Path) -> bool {
    let lowered = relative.to_string_lossy().to_lowercase();
    if RISK_TOKENS.iter().any(|token| {
        lowered
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|segment| segment == *token)
    }) {
        return true;
    }
    if let Some(ext_ok) = relative.extension().and_then(|e| e.to_str()) {
        let ext = format!(".{}", ext_ok.to_lowercase());
        if RISK_EXTENSIONS.contains(&ext.as_str()) {
            if let Some(stem) = relative.file_stem().and_then(|s| s.to_str()) {
                let stem = stem.to_lowercase();
                if RISK_EXTENSION_STEMS.iter().any(|s| stem.contains(s)) {
                    return true;
                }
            }
        }
    }
    false
}

/// Scan `root`, applying the shared ignore list, counting files and risk
/// markers up to [`SCAN_LIMIT`] files.
pub fn compute_profile(root: &Path) -> RepoProfile {
    let mut file_count = 0usize;
    let mut risk_markers = 0usize;
    let mut scan_truncated = false;

    if root.is_dir() {
        for entry in WalkDir::new(root).into_iter().filter_entry(|e| {
            let rel = e.path().strip_prefix(root).unwrap_or(e.path());
            rel.as_os_str().is_empty() || !is_ignored_relative_path(rel)
        }) {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }
            if file_count >= SCAN_LIMIT {
                scan_truncated = true;
                break;
            }
            file_count += 1;
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if path_has_risk_marker(rel) {
                risk_markers += 1;
            }
        }
    }

    let size_bucket = if file_count <= SMALL_MAX_FILES {
        SizeBucket::Small
    } else if file_count <= MEDIUM_MAX_FILES {
        SizeBucket::Medium
    } else {
        SizeBucket::Large
    };

    RepoProfile {
        file_count,
        risk_markers,
        size_bucket,
        scan_truncated,
    }
}

/// The finer-grained risk level for a profile.
pub fn risk_level(profile: &RepoProfile) -> RiskLevel {
    let large = profile.size_bucket == SizeBucket::Large;
    if profile.risk_markers >= 20 || (large && profile.risk_markers >= 8) {
        RiskLevel::High
    } else if profile.risk_markers >= 6 || large {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Collapse a [`RepoProfile`] into the coarse `{low, high}` tier the
/// preflight gate's checklist keys on. Only [`RiskLevel::High`] maps to
/// [`RiskTier::High`]; medium is folded into low.
pub fn resolve_risk_tier(profile: &RepoProfile) -> RiskTier {
    match risk_level(profile) {
        RiskLevel::High => RiskTier::High,
        RiskLevel::Medium | RiskLevel::Low => RiskTier::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn small_repo_with_no_markers_is_low_risk() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("lib.rs"), "fn lib() {}").expect("writes");
        let profile = compute_profile(dir.path());
        assert_eq!(profile.size_bucket, SizeBucket::Small);
        assert_eq!(resolve_risk_tier(&profile), RiskTier::Low);
    }

    #[test]
    fn payment_and_auth_paths_count_as_risk_markers() {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir_all(dir.path().join("src/payment")).expect("creates");
        fs::write(dir.path().join("src/payment/auth.rs"), "").expect("writes");
        let profile = compute_profile(dir.path());
        assert!(profile.risk_markers >= 1);
    }

    #[test]
    fn high_marker_count_resolves_to_high_tier() {
        let profile = RepoProfile {
            file_count: 50,
            risk_markers: 20,
            size_bucket: SizeBucket::Small,
            scan_truncated: false,
        };
        assert_eq!(risk_level(&profile), RiskLevel::High);
        assert_eq!(resolve_risk_tier(&profile), RiskTier::High);
    }

    #[test]
    fn medium_level_still_collapses_to_low_tier() {
        let profile = RepoProfile {
            file_count: 50,
            risk_markers: 6,
            size_bucket: SizeBucket::Small,
            scan_truncated: false,
        };
        assert_eq!(risk_level(&profile), RiskLevel::Medium);
        assert_eq!(resolve_risk_tier(&profile), RiskTier::Low);
    }

    #[test]
    fn large_repo_with_moderate_markers_is_high() {
        let profile = RepoProfile {
            file_count: 2000,
            risk_markers: 8,
            size_bucket: SizeBucket::Large,
            scan_truncated: false,
        };
        assert_eq!(risk_level(&profile), RiskLevel::High);
    }

    #[test]
    fn sql_file_with_matching_stem_is_a_marker() {
        let relative = Path::new("db/migration_0001.sql");
        assert!(path_has_risk_marker(relative));
    }

    #[test]
    fn unrelated_sql_file_is_not_a_marker() {
        let relative = Path::new("fixtures/sample.sql");
        assert!(!path_has_risk_marker(relative));
    }
}
