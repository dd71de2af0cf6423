// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shared ignore list applied when bootstrapping a sandbox and when
//! computing a workspace's head signature: VCS/cache directories, secret
//! leaf names, and (on Windows) reserved device names.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// First-path-segment names that exclude an entire subtree.
pub const IGNORED_DIR_NAMES: &[&str] = &[
    ".git",
    ".agents",
    ".claude",
    ".venv",
    "__pycache__",
    ".pytest_cache",
    ".ruff_cache",
    "node_modules",
    ".mypy_cache",
    ".idea",
    ".vscode",
];

/// Leaf glob suffixes that are always excluded regardless of directory.
const IGNORED_LEAF_SUFFIXES: &[&str] = &[".pyc", ".pyo"];

/// Leaf glob prefixes that are always excluded (`.env`, `.env.local`, ...).
const IGNORED_LEAF_PREFIXES: &[&str] = &[".env"];

const IGNORED_LEAF_EXTENSIONS: &[&str] = &[".pem", ".key"];

fn secret_leaf_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(^|[._-])(tokens?|secrets?|apikey|api-key|access-key)([._-]|$)")
            .expect("valid regex")
    })
}

fn windows_reserved_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(con|prn|aux|nul|com[1-9]|lpt[1-9])$").expect("valid regex")
    })
}

fn is_secret_leaf(leaf: &str) -> bool {
    secret_leaf_regex().is_match(leaf)
}

fn is_ignored_leaf(leaf: &str) -> bool {
    let lower = leaf.to_lowercase();
    if IGNORED_LEAF_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return true;
    }
    if IGNORED_LEAF_PREFIXES
        .iter()
        .any(|p| lower == *p || lower.starts_with(&format!("{p}.")))
    {
        return true;
    }
    if IGNORED_LEAF_EXTENSIONS.iter().any(|e| lower.ends_with(e)) {
        return true;
    }
    is_secret_leaf(&lower)
}

/// Whether `relative_path` (relative to a project root) must be excluded
/// from a sandbox copy or a fingerprint listing.
///
/// A path is ignored if its first segment is a VCS/cache/IDE directory
/// name, or if its leaf (file or directory name) matches a secret or
/// compiled-artifact pattern.
pub fn is_ignored_relative_path(relative_path: &Path) -> bool {
    let mut components = relative_path.components();
    if let Some(first) = components.next() {
        if let Some(name) = first.as_os_str().to_str() {
            if IGNORED_DIR_NAMES.contains(&name) {
                return true;
            }
        }
    }
    if let Some(leaf) = relative_path.file_name().and_then(|n| n.to_str()) {
        if is_ignored_leaf(leaf) {
            return true;
        }
    }
    false
}

/// Windows reserved-device check: strips a trailing `:...` suffix and
/// trailing dots/spaces before matching `con|prn|aux|nul|com1..9|lpt1..9`
/// case-insensitively. Applies regardless of file extension.
pub fn is_windows_reserved_name(leaf: &str) -> bool {
    let before_colon = leaf.split(':').next().unwrap_or(leaf);
    let trimmed = before_colon.trim_end_matches(['.', ' ']);
    let stem = trimmed.split('.').next().unwrap_or(trimmed);
    windows_reserved_regex().is_match(stem)
}
