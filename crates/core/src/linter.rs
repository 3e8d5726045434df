// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Linter descriptors and execution results.
//!
//! A [`LinterConfig`] is supplied by the external registry and never
//! mutated by the engine; a [`LinterResult`] is the terminal record of
//! one execution attempt sequence.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default wall-clock timeout for a linter run.
pub const DEFAULT_LINTER_TIMEOUT: Duration = Duration::from_secs(120);

/// Terminal status of one linter execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LintStatus {
    Pass,
    Fail,
    Error,
    Skipped,
}

impl LintStatus {
    /// PASS and SKIPPED count as successful for telemetry purposes.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Pass | Self::Skipped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Error => "ERROR",
            Self::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for LintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom skip predicate attached to a linter.
///
/// Returning `Some(reason)` marks the linter SKIPPED with that reason;
/// `None` lets execution proceed. Overrides the shared rule-based check.
#[async_trait]
pub trait SkipCheck: Send + Sync {
    async fn should_skip(&self) -> Option<String>;
}

/// Command used to probe a binary's version text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionProbe {
    pub binary: String,
    pub args: Vec<String>,
}

impl VersionProbe {
    pub fn new(binary: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            binary: binary.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Immutable descriptor of one linter, supplied by the external registry.
#[derive(Clone)]
pub struct LinterConfig {
    /// Unique, stable key. Cache entries, patterns, and logs key on this.
    pub id: String,
    /// Human-readable name carried into results.
    pub name: String,
    pub binary: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    /// Custom async skip predicate, overriding the rule-based check.
    pub skip_check: Option<Arc<dyn SkipCheck>>,
    pub expected_version: Option<String>,
    pub version_probe: Option<VersionProbe>,
}

impl LinterConfig {
    pub fn new(id: impl Into<String>, binary: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            binary: binary.into(),
            args: Vec::new(),
            timeout: DEFAULT_LINTER_TIMEOUT,
            skip_check: None,
            expected_version: None,
            version_probe: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn skip_check(mut self, check: Arc<dyn SkipCheck>) -> Self {
        self.skip_check = Some(check);
        self
    }

    /// Require `expected` to appear in the probe's output before running.
    pub fn expect_version(mut self, expected: impl Into<String>, probe: VersionProbe) -> Self {
        self.expected_version = Some(expected.into());
        self.version_probe = Some(probe);
        self
    }
}

impl fmt::Debug for LinterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinterConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("binary", &self.binary)
            .field("args", &self.args)
            .field("timeout", &self.timeout)
            .field("skip_check", &self.skip_check.is_some())
            .field("expected_version", &self.expected_version)
            .field("version_probe", &self.version_probe)
            .finish()
    }
}

/// Terminal record of one linter execution attempt sequence.
#[derive(Debug, Clone, Serialize)]
pub struct LinterResult {
    pub id: String,
    pub name: String,
    pub status: LintStatus,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub log_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl LinterResult {
    pub fn new(config: &LinterConfig, status: LintStatus) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            status,
            exit_code: None,
            duration_ms: 0,
            log_path: None,
            error: None,
        }
    }
}

#[cfg(test)]
#[path = "linter_tests.rs"]
mod tests;
