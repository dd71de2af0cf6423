// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The on-disk artifact store: `<root>/threads/<task_id>/` holding
//! `state.json`, `events.jsonl`, the markdown narrative files,
//! `decisions.json`, and an `artifacts/` directory of named JSON blobs.

use crate::error::ArtifactError;
use crate::state::TaskStateSnapshot;
use agentcheck_core::TaskEvent;
use regex::Regex;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

fn artifact_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid regex"))
}

/// Owns every task's on-disk thread directory.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Opens a store rooted at `<root>/threads/`, creating the root if
    /// necessary.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn task_dir(&self, task_id: &str) -> PathBuf {
        self.root.join("threads").join(task_id)
    }

    fn artifacts_dir(&self, task_id: &str) -> PathBuf {
        self.task_dir(task_id).join("artifacts")
    }

    /// Creates `<root>/threads/<task_id>/` and its `artifacts/`
    /// subdirectory, idempotently.
    pub fn ensure_task_dir(&self, task_id: &str) -> Result<PathBuf, ArtifactError> {
        let dir = self.task_dir(task_id);
        fs::create_dir_all(&dir)?;
        fs::create_dir_all(self.artifacts_dir(task_id))?;
        Ok(dir)
    }

    /// Atomically writes `contents` to `<dir>/<name>`: write to a
    /// same-directory `.tmp` file, `fsync`, then `rename`.
    fn write_atomic(dir: &Path, name: &str, contents: &[u8]) -> Result<(), ArtifactError> {
        fs::create_dir_all(dir)?;
        let target = dir.join(name);
        let tmp = dir.join(format!("{name}.tmp"));
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(contents)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    /// Writes `state.json` atomically.
    pub fn save_state(&self, snapshot: &TaskStateSnapshot) -> Result<(), ArtifactError> {
        let dir = self.ensure_task_dir(&snapshot.task_id)?;
        let data = serde_json::to_vec_pretty(snapshot)?;
        Self::write_atomic(&dir, "state.json", &data)
    }

    /// Reads `state.json`, if present.
    pub fn load_state(&self, task_id: &str) -> Result<Option<TaskStateSnapshot>, ArtifactError> {
        let path = self.task_dir(task_id).join("state.json");
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(path)?;
        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// Appends one JSON line to `events.jsonl`. The repository is the
    /// source of truth for `seq` ordering; this is a denormalized mirror
    /// for external tools that read the filesystem directly (the
    /// analyser, a dashboard).
    pub fn append_event_line(&self, event: &TaskEvent) -> Result<(), ArtifactError> {
        let dir = self.ensure_task_dir(event.task_id.as_str())?;
        let path = dir.join("events.jsonl");
        let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Reads all events from `events.jsonl`, in file order. Lines that
    /// fail to parse are skipped (a tolerant WAL replay rather than
    /// aborting the whole read).
    pub fn read_event_lines(&self, task_id: &str) -> Result<Vec<TaskEvent>, ArtifactError> {
        let path = self.task_dir(task_id).join("events.jsonl");
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(path)?;
        let mut events = Vec::new();
        for line in data.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TaskEvent>(line) {
                Ok(event) => events.push(event),
                Err(e) => debug!(error = %e, "skipping unparsable event line"),
            }
        }
        Ok(events)
    }

    /// Writes one of the narrative markdown files (`discussion.md`,
    /// `summary.md`, `final_report.md`), atomically.
    pub fn write_markdown(&self, task_id: &str, file_name: &str, content: &str) -> Result<(), ArtifactError> {
        let dir = self.ensure_task_dir(task_id)?;
        Self::write_atomic(&dir, file_name, content.as_bytes())
    }

    /// Reads a narrative markdown file, if present.
    pub fn read_markdown(&self, task_id: &str, file_name: &str) -> Result<Option<String>, ArtifactError> {
        let path = self.task_dir(task_id).join(file_name);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Writes `decisions.json`, atomically.
    pub fn write_decisions(&self, task_id: &str, value: &serde_json::Value) -> Result<(), ArtifactError> {
        let dir = self.ensure_task_dir(task_id)?;
        let data = serde_json::to_vec_pretty(value)?;
        Self::write_atomic(&dir, "decisions.json", &data)
    }

    /// Writes `artifacts/<name>.json`. `name` must be path-safe: no `..`,
    /// `/`, or `\`, matching `^[A-Za-z0-9][A-Za-z0-9._-]*$`.
    pub fn write_artifact(
        &self,
        task_id: &str,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<(), ArtifactError> {
        validate_artifact_name(name)?;
        self.ensure_task_dir(task_id)?;
        let dir = self.artifacts_dir(task_id);
        let data = serde_json::to_vec_pretty(value)?;
        Self::write_atomic(&dir, &format!("{name}.json"), &data)
    }

    /// Reads `artifacts/<name>.json`, if present.
    pub fn read_artifact(&self, task_id: &str, name: &str) -> Result<Option<serde_json::Value>, ArtifactError> {
        validate_artifact_name(name)?;
        let path = self.artifacts_dir(task_id).join(format!("{name}.json"));
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(path)?;
        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// Lists the (unqualified) names of every artifact in
    /// `artifacts/<task_id>/artifacts/`, without the `.json` suffix.
    pub fn list_artifact_names(&self, task_id: &str) -> Result<Vec<String>, ArtifactError> {
        let dir = self.artifacts_dir(task_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
                if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

fn validate_artifact_name(name: &str) -> Result<(), ArtifactError> {
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(ArtifactError::InvalidName(name.to_string()));
    }
    if !artifact_name_pattern().is_match(name) {
        return Err(ArtifactError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
