// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::executor::ProcessRunner;
use crate::subprocess::{CommandOutput, SubprocessError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct Harness {
    ctx: Arc<EngineContext>,
    opts: ExecOptions,
    _repo: tempfile::TempDir,
    _logs: tempfile::TempDir,
}

fn setup() -> Harness {
    let repo = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    Harness {
        ctx: Arc::new(EngineContext::new(repo.path())),
        opts: ExecOptions::new(logs.path()),
        _repo: repo,
        _logs: logs,
    }
}

/// Tracks the high-water mark of concurrent invocations.
struct CountingRunner {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl CountingRunner {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessRunner for CountingRunner {
    async fn run(
        &self,
        _binary: &str,
        _args: &[String],
        _timeout: Duration,
        _label: &str,
    ) -> Result<CommandOutput, SubprocessError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(25)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(CommandOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

/// Panics for one binary name, passes everything else.
struct PanickyRunner {
    poison: &'static str,
}

#[async_trait]
impl ProcessRunner for PanickyRunner {
    async fn run(
        &self,
        binary: &str,
        _args: &[String],
        _timeout: Duration,
        _label: &str,
    ) -> Result<CommandOutput, SubprocessError> {
        if binary == self.poison {
            panic!("poisoned runner");
        }
        Ok(CommandOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

#[tokio::test]
async fn results_preserve_submission_order() {
    let h = setup();
    let linters = vec![
        LinterConfig::new("pass-a", "true"),
        LinterConfig::new("fail-b", "false"),
        LinterConfig::new("missing-c", "no-such-binary-zzz"),
        LinterConfig::new("pass-d", "true"),
    ];
    let opts = h.opts.clone().concurrency(2);
    let results = execute_linters_in_parallel(linters, &opts, Arc::clone(&h.ctx)).await;

    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["pass-a", "fail-b", "missing-c", "pass-d"]);
    assert_eq!(results[0].status, LintStatus::Pass);
    assert_eq!(results[1].status, LintStatus::Fail);
    assert_eq!(results[2].status, LintStatus::Error);
    assert_eq!(results[3].status, LintStatus::Pass);

    let summary = calculate_summary(&results);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.passed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.skipped, 0);
}

#[tokio::test]
async fn concurrency_cap_bounds_in_flight_runs() {
    let h = setup();
    let runner = CountingRunner::new();
    let opts = h.opts.clone().concurrency(3).runner(runner.clone());
    let linters: Vec<LinterConfig> = (0..8)
        .map(|i| LinterConfig::new(format!("lint-{i}"), "sh"))
        .collect();
    let results = execute_linters_in_parallel(linters, &opts, Arc::clone(&h.ctx)).await;

    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|r| r.status == LintStatus::Pass));
    assert!(runner.peak() <= 3, "peak concurrency was {}", runner.peak());
}

#[tokio::test]
async fn panicked_worker_becomes_error_result() {
    let h = setup();
    let opts = h
        .opts
        .clone()
        .concurrency(2)
        .runner(Arc::new(PanickyRunner { poison: "sh" }));
    let linters = vec![
        LinterConfig::new("steady", "true"),
        LinterConfig::new("doomed", "sh"),
    ];
    let results = execute_linters_in_parallel(linters, &opts, Arc::clone(&h.ctx)).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status, LintStatus::Pass);
    assert_eq!(results[1].status, LintStatus::Error);
    assert!(results[1].error.as_deref().unwrap().contains("worker died"));
}

#[tokio::test]
async fn empty_batch_yields_empty_results() {
    let h = setup();
    let results = execute_linters_in_parallel(Vec::new(), &h.opts, Arc::clone(&h.ctx)).await;
    assert!(results.is_empty());

    let summary = calculate_summary(&results);
    assert_eq!(summary.total, 0);
    assert_eq!(summary.duration_ms, 0);
}

#[test]
fn default_concurrency_is_at_least_one() {
    assert!(default_concurrency() >= 1);
}

#[test]
fn summary_tallies_by_status_and_sums_durations() {
    let mk = |id: &str, status: LintStatus, ms: u64| {
        let mut r = LinterResult::new(&LinterConfig::new(id, "x"), status);
        r.duration_ms = ms;
        r
    };
    let results = vec![
        mk("a", LintStatus::Pass, 10),
        mk("b", LintStatus::Skipped, 5),
        mk("c", LintStatus::Fail, 20),
        mk("d", LintStatus::Error, 1),
    ];
    let summary = calculate_summary(&results);
    assert_eq!(
        summary,
        RunSummary {
            total: 4,
            passed: 1,
            failed: 1,
            errors: 1,
            skipped: 1,
            duration_ms: 36,
        }
    );
}
