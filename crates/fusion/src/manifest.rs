// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The content-addressed manifest auto-fusion diffs against: a mapping
//! from forward-slash relative path to a streaming SHA-256 hex digest.

use crate::error::FusionError;
use agentcheck_sandbox::is_ignored_relative_path;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use walkdir::WalkDir;

/// Mapping from relative path (forward-slash, root-relative) to a
/// lowercase-hex SHA-256 digest of its contents.
pub type FusionManifest = BTreeMap<String, String>;

const READ_CHUNK: usize = 64 * 1024;

fn hash_file(path: &Path) -> Result<String, FusionError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    let digest = hasher.finalize();
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// Walk `root`, applying the shared ignore list, and compute a manifest
/// of every remaining file's SHA-256 digest keyed by its forward-slash
/// relative path.
pub fn compute_manifest(root: &Path) -> Result<FusionManifest, FusionError> {
    let mut manifest = FusionManifest::new();
    if !root.is_dir() {
        return Ok(manifest);
    }

    for entry in WalkDir::new(root).into_iter().filter_entry(|e| {
        let rel = e.path().strip_prefix(root).unwrap_or(e.path());
        rel.as_os_str().is_empty() || !is_ignored_relative_path(rel)
    }) {
        let entry = entry.map_err(|e| {
            FusionError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walk error")),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let key = rel.to_string_lossy().replace('\\', "/");
        let digest = hash_file(entry.path())?;
        manifest.insert(key, digest);
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn computes_digests_for_files() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("a.txt"), "v1").expect("writes");
        let manifest = compute_manifest(dir.path()).expect("computes");
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest["a.txt"].len(), 64);
    }

    #[test]
    fn identical_content_yields_identical_digest() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("a.txt"), "same").expect("writes");
        fs::write(dir.path().join("b.txt"), "same").expect("writes");
        let manifest = compute_manifest(dir.path()).expect("computes");
        assert_eq!(manifest["a.txt"], manifest["b.txt"]);
    }

    #[test]
    fn ignores_vcs_directories() {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir(dir.path().join(".git")).expect("creates");
        fs::write(dir.path().join(".git").join("HEAD"), "ref").expect("writes");
        fs::write(dir.path().join("a.txt"), "v1").expect("writes");
        let manifest = compute_manifest(dir.path()).expect("computes");
        assert_eq!(manifest.len(), 1);
        assert!(manifest.contains_key("a.txt"));
    }

    #[test]
    fn missing_root_yields_empty_manifest() {
        let manifest = compute_manifest(Path::new("/definitely/not/real")).expect("computes");
        assert!(manifest.is_empty());
    }
}
