// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The auto-fusion algorithm: diff a sandbox against a target tree,
//! apply the diff, and archive a snapshot.

use crate::error::FusionError;
use crate::manifest::{compute_manifest, FusionManifest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::FileOptions;
use zip::ZipWriter;

/// The result of one auto-fusion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionOutcome {
    pub mode: String,
    pub changed_files: Vec<String>,
    pub deleted_files: Vec<String>,
    pub snapshot_path: Option<String>,
    pub changelog_path: Option<String>,
    pub merged_at: DateTime<Utc>,
}

pub struct FusionManager;

impl FusionManager {
    /// Diff `source_root` against `before_manifest`, apply the diff to
    /// `target_root`, and (when there were changes) write a changelog
    /// and a snapshot zip under `snapshot_root`.
    pub fn merge(
        task_id: &str,
        source_root: &Path,
        target_root: &Path,
        before_manifest: &FusionManifest,
        snapshot_root: &Path,
    ) -> Result<FusionOutcome, FusionError> {
        let after_manifest = compute_manifest(source_root)?;

        let mut changed: BTreeSet<String> = BTreeSet::new();
        for (path, hash) in &after_manifest {
            if before_manifest.get(path) != Some(hash) {
                changed.insert(path.clone());
            }
        }
        let deleted: BTreeSet<String> = before_manifest
            .keys()
            .filter(|p| !after_manifest.contains_key(*p))
            .cloned()
            .collect();

        let same_root = paths_equal(source_root, target_root);
        let merged_at = Utc::now();

        if same_root && changed.is_empty() && deleted.is_empty() {
            return Ok(FusionOutcome {
                mode: "no_changes".to_string(),
                changed_files: Vec::new(),
                deleted_files: Vec::new(),
                snapshot_path: None,
                changelog_path: None,
                merged_at,
            });
        }

        let mode = if same_root { "in_place" } else { "cross_repo" };

        if !same_root {
            for path in &changed {
                let src = source_root.join(path);
                let dst = target_root.join(path);
                if let Some(parent) = dst.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(&src, &dst)?;
            }
            for path in &deleted {
                let dst = target_root.join(path);
                if dst.exists() {
                    fs::remove_file(&dst)?;
                }
            }
        }

        let changed_files: Vec<String> = changed.into_iter().collect();
        let deleted_files: Vec<String> = deleted.into_iter().collect();

        let (snapshot_path, changelog_path) = Self::write_snapshot(
            task_id,
            source_root,
            snapshot_root,
            &changed_files,
            &deleted_files,
            merged_at,
        )?;

        info!(
            task_id,
            mode,
            changed = changed_files.len(),
            deleted = deleted_files.len(),
            "auto-fusion merge completed"
        );

        Ok(FusionOutcome {
            mode: mode.to_string(),
            changed_files,
            deleted_files,
            snapshot_path: Some(snapshot_path),
            changelog_path: Some(changelog_path),
            merged_at,
        })
    }

    fn write_snapshot(
        task_id: &str,
        source_root: &Path,
        snapshot_root: &Path,
        changed_files: &[String],
        deleted_files: &[String],
        merged_at: DateTime<Utc>,
    ) -> Result<(String, String), FusionError> {
        fs::create_dir_all(snapshot_root)?;
        let stamp = merged_at.format("%Y%m%dT%H%M%SZ");
        let changelog_path = snapshot_root.join(format!("{task_id}-{stamp}.changelog.md"));
        let snapshot_path = snapshot_root.join(format!("{task_id}-{stamp}.zip"));

        let mut changelog = String::new();
        changelog.push_str(&format!("# Auto-fusion changelog: {task_id}\n\n"));
        changelog.push_str(&format!("Merged at: {}\n\n", merged_at.to_rfc3339()));
        changelog.push_str("## Changed files\n\n");
        for f in changed_files {
            changelog.push_str(&format!("- {f}\n"));
        }
        changelog.push_str("\n## Deleted files\n\n");
        for f in deleted_files {
            changelog.push_str(&format!("- {f}\n"));
        }
        fs::write(&changelog_path, changelog)?;

        let meta = serde_json::json!({
            "task_id": task_id,
            "changed_files": changed_files,
            "deleted_files": deleted_files,
            "merged_at": merged_at.to_rfc3339(),
        });

        let file = File::create(&snapshot_path)?;
        let mut zip = ZipWriter::new(file);
        let options =
            FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("meta.json", options)?;
        zip.write_all(serde_json::to_string_pretty(&meta)?.as_bytes())?;

        for path in changed_files {
            let src = source_root.join(path);
            if !src.is_file() {
                continue;
            }
            zip.start_file(path, options)?;
            let contents = fs::read(&src)?;
            zip.write_all(&contents)?;
        }
        zip.finish()?;

        Ok((
            path_to_string(&snapshot_path),
            path_to_string(&changelog_path),
        ))
    }
}

fn paths_equal(a: &Path, b: &Path) -> bool {
    let canon_a = fs::canonicalize(a).unwrap_or_else(|_| a.to_path_buf());
    let canon_b = fs::canonicalize(b).unwrap_or_else(|_| b.to_path_buf());
    canon_a == canon_b
}

fn path_to_string(path: &PathBuf) -> String {
    path.display().to_string()
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
