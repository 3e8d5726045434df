// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental execution tracking driven by `git diff`.
//!
//! Maps linter ids to file-glob patterns and decides whether relevant
//! files changed since HEAD. Every failure path collapses to "must
//! execute": false positives cost an unnecessary run, false negatives
//! would miss findings.

use crate::subprocess::{run_with_timeout, GIT_COMMAND_TIMEOUT};
use lintfleet_core::clock::{Clock, SystemClock};
use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Window during which a cached decision may be replayed.
pub const DEFAULT_DECISION_INTERVAL: Duration = Duration::from_secs(5);

/// Classification of detected changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// No classified changes (also used when detection is unavailable).
    None,
    Mixed,
}

/// Result of one change-detection pass. Derived per call, not persisted.
#[derive(Debug, Clone)]
pub struct ChangeResult {
    pub has_changes: bool,
    pub changed_files: Vec<String>,
    pub change_type: ChangeType,
}

/// Whether a linter must execute, and why.
#[derive(Debug, Clone)]
pub struct ExecutionDecision {
    pub should_execute: bool,
    pub reason: String,
    pub last_check_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerStats {
    pub git_available: bool,
    /// Decision-cache entry count.
    pub tracked_linters: usize,
    /// Pattern-map size, including built-in defaults.
    pub registered_patterns: usize,
}

#[derive(Debug, Clone)]
struct CachedDecision {
    should_execute: bool,
    reason: String,
    hash: String,
    checked_at_ms: u64,
}

/// Tracks per-linter glob patterns and caches execution decisions.
pub struct ChangeTracker<C: Clock = SystemClock> {
    repo_root: PathBuf,
    clock: C,
    patterns: Mutex<HashMap<String, Vec<String>>>,
    decisions: Mutex<HashMap<String, CachedDecision>>,
}

impl ChangeTracker<SystemClock> {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self::with_clock(repo_root, SystemClock)
    }
}

impl<C: Clock> ChangeTracker<C> {
    pub fn with_clock(repo_root: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            repo_root: repo_root.into(),
            clock,
            patterns: Mutex::new(default_patterns()),
            decisions: Mutex::new(HashMap::new()),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Register glob patterns for a linter. Last registration wins.
    pub fn register_pattern(
        &self,
        linter_id: &str,
        patterns: impl IntoIterator<Item = impl Into<String>>,
    ) {
        self.patterns.lock().insert(
            linter_id.to_string(),
            patterns.into_iter().map(Into::into).collect(),
        );
    }

    /// Registered patterns for a linter id, if any.
    pub fn patterns_for(&self, linter_id: &str) -> Option<Vec<String>> {
        self.patterns.lock().get(linter_id).cloned()
    }

    /// Run `git diff --name-only HEAD` unscoped; pathspec filtering is
    /// done in-process so one invocation serves every pattern set.
    /// `None` means detection is unavailable (no git, no repo).
    async fn diff_names(&self) -> Option<String> {
        self.git_output(&["diff", "--name-only", "HEAD"], "git diff")
            .await
    }

    async fn git_output(&self, args: &[&str], label: &str) -> Option<String> {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(&self.repo_root)
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE");
        match run_with_timeout(cmd, GIT_COMMAND_TIMEOUT, label).await {
            Ok(output) if output.success() => Some(output.stdout),
            Ok(output) => {
                tracing::debug!(
                    label,
                    exit_code = output.exit_code,
                    stderr = %output.stderr.trim(),
                    "git query failed"
                );
                None
            }
            Err(e) => {
                tracing::debug!(label, error = %e, "git invocation failed");
                None
            }
        }
    }

    /// Detect whether any file matching `patterns` changed since HEAD.
    ///
    /// Detection failure conservatively reports changes with
    /// `change_type: None` and an empty file list.
    pub async fn detect_changes(&self, patterns: &[String]) -> ChangeResult {
        let Some(diff) = self.diff_names().await else {
            return ChangeResult {
                has_changes: true,
                changed_files: Vec::new(),
                change_type: ChangeType::None,
            };
        };
        let changed_files: Vec<String> = diff
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| patterns.iter().any(|p| pattern_matches(p, line)))
            .map(str::to_string)
            .collect();
        if changed_files.is_empty() {
            ChangeResult {
                has_changes: false,
                changed_files,
                change_type: ChangeType::None,
            }
        } else {
            ChangeResult {
                has_changes: true,
                changed_files,
                change_type: ChangeType::Mixed,
            }
        }
    }

    /// Opaque fingerprint of the current uncommitted changes.
    ///
    /// Empty string means "hash unavailable"; callers must treat that
    /// as never-matching so cached decisions cannot be served stale.
    pub async fn state_hash(&self) -> String {
        match self.diff_names().await {
            Some(diff) => {
                let mut hasher = Sha256::new();
                hasher.update(diff.as_bytes());
                hasher
                    .finalize()
                    .iter()
                    .map(|b| format!("{b:02x}"))
                    .collect()
            }
            None => String::new(),
        }
    }

    /// Whether any tracked file matches `patterns` (`git ls-files`).
    ///
    /// `None` when the scan is unavailable; callers must not skip on it.
    pub async fn has_matching_files(&self, patterns: &[String]) -> Option<bool> {
        let listing = self.git_output(&["ls-files"], "git ls-files").await?;
        Some(
            listing
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .any(|line| patterns.iter().any(|p| pattern_matches(p, line))),
        )
    }

    /// Decide whether a linter must execute.
    ///
    /// No registered pattern means execute. A cached decision is
    /// replayed only while `interval` has not elapsed and the freshly
    /// computed state hash matches the one stored with the decision.
    pub async fn get_execution_decision(
        &self,
        linter_id: &str,
        interval: Option<Duration>,
    ) -> ExecutionDecision {
        let now = self.clock.epoch_ms();
        let Some(patterns) = self.patterns_for(linter_id) else {
            return ExecutionDecision {
                should_execute: true,
                reason: format!("no pattern registered for '{linter_id}'"),
                last_check_ms: now,
            };
        };

        let interval = interval.unwrap_or(DEFAULT_DECISION_INTERVAL);
        let hash = self.state_hash().await;
        {
            let decisions = self.decisions.lock();
            if let Some(cached) = decisions.get(linter_id) {
                if now.saturating_sub(cached.checked_at_ms) < interval.as_millis() as u64
                    && !hash.is_empty()
                    && cached.hash == hash
                {
                    return ExecutionDecision {
                        should_execute: cached.should_execute,
                        reason: cached.reason.clone(),
                        last_check_ms: cached.checked_at_ms,
                    };
                }
            }
        }

        let result = self.detect_changes(&patterns).await;
        let reason = if result.has_changes {
            match result.change_type {
                ChangeType::None => "change detection unavailable, executing conservatively".to_string(),
                ChangeType::Mixed => format!(
                    "changes detected in {} tracked file(s)",
                    result.changed_files.len()
                ),
            }
        } else {
            "no relevant changes since HEAD".to_string()
        };
        self.decisions.lock().insert(
            linter_id.to_string(),
            CachedDecision {
                should_execute: result.has_changes,
                reason: reason.clone(),
                hash,
                checked_at_ms: now,
            },
        );
        ExecutionDecision {
            should_execute: result.has_changes,
            reason,
            last_check_ms: now,
        }
    }

    pub fn clear(&self) {
        self.decisions.lock().clear();
    }

    pub fn clear_linter(&self, linter_id: &str) {
        self.decisions.lock().remove(linter_id);
    }

    pub async fn stats(&self) -> TrackerStats {
        let git_available = self.git_output(&["--version"], "git version").await.is_some();
        TrackerStats {
            git_available,
            tracked_linters: self.decisions.lock().len(),
            registered_patterns: self.patterns.lock().len(),
        }
    }

    /// Plant a decision-cache entry pinned to the current state hash.
    #[cfg(any(test, feature = "test-support"))]
    pub async fn seed_decision(&self, linter_id: &str, should_execute: bool, reason: &str) {
        let hash = self.state_hash().await;
        let now = self.clock.epoch_ms();
        self.decisions.lock().insert(
            linter_id.to_string(),
            CachedDecision {
                should_execute,
                reason: reason.to_string(),
                hash,
                checked_at_ms: now,
            },
        );
    }
}

/// Built-in pattern defaults for common linter ids. Registrations
/// override these per id.
fn default_patterns() -> HashMap<String, Vec<String>> {
    let defaults: [(&str, &[&str]); 5] = [
        ("shellcheck", &["**/*.sh", "**/*.bash"]),
        ("hadolint", &["**/Dockerfile", "**/Dockerfile.*", "**/*.dockerfile"]),
        ("yamllint", &["**/*.yml", "**/*.yaml"]),
        ("markdownlint", &["**/*.md"]),
        ("actionlint", &[".github/workflows/*.yml", ".github/workflows/*.yaml"]),
    ];
    defaults
        .into_iter()
        .map(|(id, patterns)| {
            (
                id.to_string(),
                patterns.iter().map(|p| (*p).to_string()).collect(),
            )
        })
        .collect()
}

/// Match a repo-relative path against one glob pattern.
///
/// Also matched against the bare file name so `Dockerfile.*`-style
/// patterns hit nested files. A malformed pattern matches everything
/// (fail open toward execution).
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let Ok(compiled) = glob::Pattern::new(pattern) else {
        return true;
    };
    if compiled.matches(path) {
        return true;
    }
    Path::new(path)
        .file_name()
        .map(|name| compiled.matches(&name.to_string_lossy()))
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
