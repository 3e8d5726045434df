// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess spawning with wall-clock timeouts.
//!
//! The shape of a finished command is decided once here: a
//! [`CommandOutput`] with named fields, never a duck-typed error value.

use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Timeout for version probe commands (forced kill on expiry).
pub const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for git queries (diff, ls-files).
pub const GIT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from spawning or waiting on a child process.
#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("failed to spawn {label}: {source}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{label} timed out after {timeout_ms}ms")]
    Timeout { label: String, timeout_ms: u64 },
    #[error("{label} failed: {source}")]
    Wait {
        label: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured output of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code; -1 when the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Combined stdout + stderr length, fed to telemetry byte counts.
    pub fn byte_len(&self) -> u64 {
        (self.stdout.len() + self.stderr.len()) as u64
    }
}

/// Run a command, killing it with SIGKILL once `timeout` elapses.
///
/// `label` names the command in errors and logs.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    label: &str,
) -> Result<CommandOutput, SubprocessError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|source| SubprocessError::Spawn {
        label: label.to_string(),
        source,
    })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }),
        Ok(Err(source)) => Err(SubprocessError::Wait {
            label: label.to_string(),
            source,
        }),
        // kill_on_drop reaps the child with SIGKILL
        Err(_) => Err(SubprocessError::Timeout {
            label: label.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
