// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single-instance lock file the overnight/benchmark drivers use so
//! only one process schedules tasks at a time. First line is the
//! decimal PID, second line an ISO-8601 timestamp, remaining lines are
//! ignored.

use crate::error::AutomationError;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
fn pid_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    // SAFETY: signal 0 performs no action beyond existence/permission
    // checks; `pid` is a plain integer with no aliasing concerns.
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

#[cfg(windows)]
fn pid_alive(pid: u32) -> bool {
    use windows_sys::Win32::Foundation::CloseHandle;
    use windows_sys::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

    if pid == 0 {
        return false;
    }
    // SAFETY: OpenProcess/CloseHandle are called with a plain PID and a
    // handle this function owns exclusively; no shared state is mutated.
    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
        if handle == 0 {
            return false;
        }
        CloseHandle(handle);
        true
    }
}

#[cfg(not(any(unix, windows)))]
fn pid_alive(_pid: u32) -> bool {
    false
}

fn read_lock_pid(path: &Path) -> Option<u32> {
    let content = fs::read_to_string(path).ok()?;
    let first_line = content.lines().next()?.trim();
    first_line.parse().ok()
}

/// A held single-instance lock file. Removed on drop, but only if this
/// process is still the recorded owner — another process may have
/// reclaimed a stale lock in the meantime.
pub struct SingleInstanceLock {
    path: PathBuf,
    pid: u32,
}

impl SingleInstanceLock {
    /// Acquire the lock at `path`, reclaiming it if the recorded owner
    /// is no longer alive. `pid_exists` is a seam for tests; pass `None`
    /// to use the platform-appropriate probe.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, AutomationError> {
        Self::acquire_with(path, std::process::id(), pid_alive)
    }

    pub fn acquire_with(
        path: impl Into<PathBuf>,
        pid: u32,
        pid_exists: impl Fn(u32) -> bool,
    ) -> Result<Self, AutomationError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        if let Some(existing_pid) = read_lock_pid(&path) {
            if pid_exists(existing_pid) {
                return Err(AutomationError::LockHeld(existing_pid));
            }
        }
        if path.exists() {
            fs::remove_file(&path)?;
        }

        let mut file = OpenOptions::new().create_new(true).write(true).open(&path)?;
        let payload = format!("{pid}\n{}\n", Local::now().to_rfc3339());
        file.write_all(payload.as_bytes())?;

        Ok(Self { path, pid })
    }
}

impl Drop for SingleInstanceLock {
    fn drop(&mut self) {
        match read_lock_pid(&self.path) {
            Some(owner) if owner != self.pid => {}
            _ => {
                let _ = fs::remove_file(&self.path);
            }
        }
    }
}
