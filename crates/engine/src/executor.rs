// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-linter execution state machine.
//!
//! One invocation walks skip gate → binary check → version check →
//! run-with-retry → status classification, strictly in order, and
//! always lands in exactly one terminal [`LintStatus`]. Every terminal
//! transition fires the status hook and records telemetry.

use crate::cache::SkipDecision;
use crate::context::EngineContext;
use crate::run_logger::RunLogger;
use crate::subprocess::{run_with_timeout, CommandOutput, SubprocessError, VERSION_PROBE_TIMEOUT};
use async_trait::async_trait;
use lintfleet_core::clock::Clock;
use lintfleet_core::linter::{LintStatus, LinterConfig, LinterResult, VersionProbe};
use lintfleet_core::telemetry::PendingExecution;
use lintfleet_core::trace::TraceContext;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default budget of extra attempts after a transient failure.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Spawns a linter's process. Injectable so tests can count and script
/// spawn attempts.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        binary: &str,
        args: &[String],
        timeout: Duration,
        label: &str,
    ) -> Result<CommandOutput, SubprocessError>;
}

/// Real runner backed by `tokio::process`.
pub struct TokioRunner;

#[async_trait]
impl ProcessRunner for TokioRunner {
    async fn run(
        &self,
        binary: &str,
        args: &[String],
        timeout: Duration,
        label: &str,
    ) -> Result<CommandOutput, SubprocessError> {
        let mut cmd = tokio::process::Command::new(binary);
        cmd.args(args);
        run_with_timeout(cmd, timeout, label).await
    }
}

/// Classifies a finished run into PASS or FAIL.
///
/// Supplied by the caller; linters whose nonzero exits encode findings
/// rather than failures plug in their own classifier.
pub trait StatusClassifier: Send + Sync {
    fn determine_status(&self, linter: &LinterConfig, output: &CommandOutput) -> LintStatus;
}

/// Exit code zero is PASS, anything else FAIL.
pub struct ExitCodeClassifier;

impl StatusClassifier for ExitCodeClassifier {
    fn determine_status(&self, _linter: &LinterConfig, output: &CommandOutput) -> LintStatus {
        if output.success() {
            LintStatus::Pass
        } else {
            LintStatus::Fail
        }
    }
}

/// Observer invoked on every terminal transition.
pub type StatusHook = Arc<dyn Fn(&str, LintStatus) + Send + Sync>;

/// Options for one engine run, shared across all dispatched linters.
#[derive(Clone)]
pub struct ExecOptions {
    pub incremental: bool,
    /// Extra attempts allowed after a transient failure.
    pub max_retries: u32,
    pub log_dir: PathBuf,
    /// Worker-pool cap; `None` means `max(1, cores − 1)`.
    pub concurrency: Option<usize>,
    /// Parent trace context; each linter gets a child span.
    pub trace: TraceContext,
    pub on_status_change: Option<StatusHook>,
    pub classifier: Arc<dyn StatusClassifier>,
    pub runner: Arc<dyn ProcessRunner>,
}

impl ExecOptions {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            incremental: false,
            max_retries: DEFAULT_MAX_RETRIES,
            log_dir: log_dir.into(),
            concurrency: None,
            trace: TraceContext::new(),
            on_status_change: None,
            classifier: Arc::new(ExitCodeClassifier),
            runner: Arc::new(TokioRunner),
        }
    }

    pub fn incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn trace(mut self, trace: TraceContext) -> Self {
        self.trace = trace;
        self
    }

    pub fn on_status_change(mut self, hook: StatusHook) -> Self {
        self.on_status_change = Some(hook);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn StatusClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }
}

const TRANSIENT_MARKERS: &[&str] = &[
    "econnreset",
    "econnrefused",
    "etimedout",
    "eai_again",
    "epipe",
    "socket hang up",
    "connection reset",
    "timed out",
    "temporarily unavailable",
];

/// Whether a process failure is likely recoverable on retry.
pub fn is_transient_error(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Run one linter through its full lifecycle.
pub async fn execute_linter<C: Clock>(
    linter: &LinterConfig,
    opts: &ExecOptions,
    ctx: &EngineContext<C>,
) -> LinterResult {
    let trace = opts.trace.child();
    let pending = ctx.telemetry.start_execution(&linter.id, &trace);
    let logger = RunLogger::new(&opts.log_dir);
    let started = Instant::now();
    tracing::info!(
        linter_id = %linter.id,
        traceparent = %trace.to_traceparent(),
        "executing linter"
    );

    // 1. Incremental gate
    if opts.incremental {
        let decision = ctx.tracker.get_execution_decision(&linter.id, None).await;
        if !decision.should_execute {
            logger.append(
                &linter.id,
                &format!("SKIPPED (incremental): {}", decision.reason),
            );
            let result = LinterResult::new(linter, LintStatus::Skipped);
            return finish(ctx, opts, pending, result, started, 0, None);
        }
    }

    // 2. Skip check: custom predicate overrides the shared rules
    let skip_reason = match &linter.skip_check {
        Some(check) => check.should_skip().await,
        None => should_skip_linter(linter, ctx).await,
    };
    if let Some(reason) = skip_reason {
        logger.append(&linter.id, &format!("SKIPPED: {reason}"));
        let result = LinterResult::new(linter, LintStatus::Skipped);
        return finish(ctx, opts, pending, result, started, 0, None);
    }

    // 3. Binary presence
    if !binary_available(linter, ctx) {
        let message = format!("binary not found: {}", linter.binary);
        logger.append(&linter.id, &message);
        let mut result = LinterResult::new(linter, LintStatus::Error);
        result.error = Some(message.clone());
        return finish(ctx, opts, pending, result, started, 0, Some(message));
    }

    // 4. Version verification
    if let (Some(expected), Some(probe)) = (&linter.expected_version, &linter.version_probe) {
        if let Err(message) = verify_version(linter, expected, probe, opts, ctx).await {
            logger.append(&linter.id, &message);
            let mut result = LinterResult::new(linter, LintStatus::Error);
            result.error = Some(message.clone());
            return finish(ctx, opts, pending, result, started, 0, Some(message));
        }
    }

    // 5. Run with bounded retry on transient failures
    let mut attempt: u32 = 0;
    loop {
        match opts
            .runner
            .run(&linter.binary, &linter.args, linter.timeout, &linter.id)
            .await
        {
            Ok(output) => {
                logger.append_output(&linter.id, &output);
                let status = opts.classifier.determine_status(linter, &output);
                let mut result = LinterResult::new(linter, status);
                result.exit_code = Some(output.exit_code);
                return finish(ctx, opts, pending, result, started, output.byte_len(), None);
            }
            Err(e) => {
                let message = e.to_string();
                if is_transient_error(&message) && attempt < opts.max_retries {
                    attempt += 1;
                    tracing::warn!(
                        linter_id = %linter.id,
                        attempt,
                        error = %message,
                        "transient failure, retrying"
                    );
                    logger.append(
                        &linter.id,
                        &format!("retrying after transient failure: {message}"),
                    );
                    continue;
                }
                logger.append(&linter.id, &message);
                let mut result = LinterResult::new(linter, LintStatus::Error);
                result.error = Some(message.clone());
                return finish(ctx, opts, pending, result, started, 0, Some(message));
            }
        }
    }
}

/// Close out a terminal transition: duration, log path, telemetry,
/// status hook.
fn finish<C: Clock>(
    ctx: &EngineContext<C>,
    opts: &ExecOptions,
    pending: PendingExecution,
    mut result: LinterResult,
    started: Instant,
    bytes: u64,
    error: Option<String>,
) -> LinterResult {
    result.duration_ms = started.elapsed().as_millis() as u64;
    if result.log_path.is_none() {
        result.log_path = Some(RunLogger::new(&opts.log_dir).log_path(&result.id));
    }
    ctx.telemetry
        .record_execution(pending, bytes, result.status.is_success(), error);
    if let Some(hook) = &opts.on_status_change {
        hook(&result.id, result.status);
    }
    tracing::info!(
        linter_id = %result.id,
        status = %result.status,
        duration_ms = result.duration_ms,
        "linter finished"
    );
    result
}

/// Shared rule-based skip check: a linter with registered patterns but
/// no matching tracked files has nothing to check.
///
/// Consulted through the skip-decision cache under the current state
/// hash. An unavailable scan or hash never skips and never caches.
async fn should_skip_linter<C: Clock>(
    linter: &LinterConfig,
    ctx: &EngineContext<C>,
) -> Option<String> {
    let hash = ctx.tracker.state_hash().await;
    if let Some(cached) = ctx.cache.get_skip_decision(&linter.id, &hash) {
        return cached
            .skip
            .then(|| cached.reason.unwrap_or_else(|| "no relevant files".to_string()));
    }
    let patterns = ctx.tracker.patterns_for(&linter.id)?;
    let decision = match ctx.tracker.has_matching_files(&patterns).await {
        Some(false) => SkipDecision {
            skip: true,
            reason: Some(format!("no files matching {}", patterns.join(", "))),
        },
        Some(true) => SkipDecision {
            skip: false,
            reason: None,
        },
        None => return None,
    };
    ctx.cache
        .set_skip_decision(&linter.id, decision.clone(), hash);
    decision
        .skip
        .then(|| decision.reason.unwrap_or_else(|| "no relevant files".to_string()))
}

fn binary_available<C: Clock>(linter: &LinterConfig, ctx: &EngineContext<C>) -> bool {
    if let Some(cached) = ctx.cache.get_binary(&linter.id) {
        return cached;
    }
    let present = resolve_binary(&linter.binary);
    ctx.cache.set_binary(&linter.id, present);
    present
}

/// Resolve a binary: explicit paths are checked directly, bare names
/// are searched on PATH.
fn resolve_binary(binary: &str) -> bool {
    let path = Path::new(binary);
    if path.is_absolute() || path.components().count() > 1 {
        return is_executable(path);
    }
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| is_executable(&dir.join(binary)))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Probe and compare the linter's version. Observed output is cached;
/// a probe that yields nothing compares as "unknown" and is not cached.
async fn verify_version<C: Clock>(
    linter: &LinterConfig,
    expected: &str,
    probe: &VersionProbe,
    opts: &ExecOptions,
    ctx: &EngineContext<C>,
) -> Result<(), String> {
    let observed = match ctx.cache.get_version(&linter.id) {
        Some(cached) => cached,
        None => {
            let label = format!("{} version probe", linter.id);
            match opts
                .runner
                .run(&probe.binary, &probe.args, VERSION_PROBE_TIMEOUT, &label)
                .await
            {
                Ok(output) => {
                    let text = if output.stdout.trim().is_empty() {
                        output.stderr.trim().to_string()
                    } else {
                        output.stdout.trim().to_string()
                    };
                    if text.is_empty() {
                        "unknown".to_string()
                    } else {
                        ctx.cache.set_version(&linter.id, &text);
                        text
                    }
                }
                Err(e) => {
                    tracing::debug!(linter_id = %linter.id, error = %e, "version probe failed");
                    "unknown".to_string()
                }
            }
        }
    };
    if observed.contains(expected) {
        Ok(())
    } else {
        Err(format!(
            "version mismatch for {}: expected {expected}, found {observed}",
            linter.id
        ))
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
