// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace fingerprinting: a compact summary of the roots a task
//! touches, used by the workflow engine to detect drift between task
//! creation and a later resume.

use crate::ignore::is_ignored_relative_path;
use agentcheck_core::WorkspaceFingerprint;
use sha1::{Digest, Sha1};
use std::fs;
use std::path::Path;

/// Normalize a path for fingerprint comparisons: forward slashes
/// everywhere, and case-insensitive on Windows.
fn normalize_path(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    if cfg!(windows) {
        s.to_lowercase()
    } else {
        s
    }
}

/// A short SHA-1 signature (20 hex chars) over the sorted top-level
/// directory/file listing of `root`, ignoring ignored entries. Returns
/// an empty string if `root` doesn't exist or can't be read.
pub fn head_signature(root: &Path) -> String {
    let Ok(entries) = fs::read_dir(root) else {
        return String::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            let rel = Path::new(&name);
            if is_ignored_relative_path(rel) {
                None
            } else {
                Some(name)
            }
        })
        .collect();
    names.sort();

    let mut hasher = Sha1::new();
    for name in &names {
        hasher.update(name.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hasher.finalize();
    let full: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    full.chars().take(20).collect()
}

/// Build the fingerprint recorded on a task at sandbox creation time.
pub fn build_fingerprint(
    project_path: &Path,
    workspace_path: &Path,
    sandbox_workspace_path: Option<&Path>,
    merge_target_path: Option<&Path>,
) -> WorkspaceFingerprint {
    WorkspaceFingerprint {
        project_path: normalize_path(project_path),
        workspace_path: normalize_path(workspace_path),
        sandbox_workspace_path: sandbox_workspace_path.map(normalize_path),
        merge_target_path: merge_target_path.map(normalize_path),
        project_has_git: project_path.join(".git").exists(),
        project_head_signature: head_signature(project_path),
        workspace_head_signature: head_signature(workspace_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn head_signature_is_stable_for_same_listing() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("a.txt"), "1").expect("writes");
        fs::write(dir.path().join("b.txt"), "2").expect("writes");
        let sig1 = head_signature(dir.path());
        let sig2 = head_signature(dir.path());
        assert_eq!(sig1, sig2);
        assert_eq!(sig1.len(), 20);
    }

    #[test]
    fn head_signature_ignores_vcs_dirs() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("a.txt"), "1").expect("writes");
        let without_git = head_signature(dir.path());

        fs::create_dir(dir.path().join(".git")).expect("creates");
        let with_git = head_signature(dir.path());
        assert_eq!(without_git, with_git);
    }

    #[test]
    fn head_signature_changes_when_listing_changes() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("a.txt"), "1").expect("writes");
        let before = head_signature(dir.path());
        fs::write(dir.path().join("b.txt"), "2").expect("writes");
        let after = head_signature(dir.path());
        assert_ne!(before, after);
    }

    #[test]
    fn missing_root_yields_empty_signature() {
        assert_eq!(head_signature(Path::new("/definitely/not/a/real/path")), "");
    }

    #[test]
    fn build_fingerprint_detects_git_presence() {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir(dir.path().join(".git")).expect("creates");
        let fp = build_fingerprint(dir.path(), dir.path(), None, None);
        assert!(fp.project_has_git);
        assert!(fp.sandbox_workspace_path.is_none());
    }
}
