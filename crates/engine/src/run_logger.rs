// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only logger for per-linter run logs.

use crate::subprocess::CommandOutput;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only logger writing to `<log_dir>/<linter_id>.log`.
///
/// Each `append()` call opens, writes, and closes the file. Failures
/// are logged via tracing but do not propagate — logging must not
/// break the engine.
pub struct RunLogger {
    log_dir: PathBuf,
}

impl RunLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Log file path for one linter.
    pub fn log_path(&self, linter_id: &str) -> PathBuf {
        self.log_dir.join(format!("{linter_id}.log"))
    }

    /// Append a single line to the linter's log.
    pub fn append(&self, linter_id: &str, line: &str) {
        if let Err(e) = self.write_line(linter_id, line) {
            tracing::warn!(linter_id, error = %e, "failed to write run log");
        }
    }

    /// Append a finished command's streams to the linter's log.
    pub fn append_output(&self, linter_id: &str, output: &CommandOutput) {
        if !output.stdout.is_empty() {
            self.append(linter_id, output.stdout.trim_end());
        }
        if !output.stderr.is_empty() {
            self.append(linter_id, output.stderr.trim_end());
        }
        self.append(linter_id, &format!("exit code: {}", output.exit_code));
    }

    fn write_line(&self, linter_id: &str, line: &str) -> std::io::Result<()> {
        let path = self.log_path(linter_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")
    }
}

#[cfg(test)]
#[path = "run_logger_tests.rs"]
mod tests;
