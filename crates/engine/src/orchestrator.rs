// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-concurrency dispatch of a linter batch.
//!
//! Every configured linter yields exactly one [`LinterResult`], in the
//! order the batch was submitted. A panicked worker is converted into
//! an ERROR result for its linter instead of poisoning the run.

use crate::context::EngineContext;
use crate::executor::{execute_linter, ExecOptions};
use lintfleet_core::clock::Clock;
use lintfleet_core::linter::{LintStatus, LinterConfig, LinterResult};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Aggregate counts for one batch. SKIPPED counts toward neither
/// passed nor failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub skipped: usize,
    /// Sum of per-linter durations, not wall clock.
    pub duration_ms: u64,
}

/// Worker-pool cap when none is configured: all cores but one, at
/// least one.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Run a batch of linters with at most `opts.concurrency` in flight.
pub async fn execute_linters_in_parallel<C: Clock + 'static>(
    linters: Vec<LinterConfig>,
    opts: &ExecOptions,
    ctx: Arc<EngineContext<C>>,
) -> Vec<LinterResult> {
    let cap = opts.concurrency.unwrap_or_else(default_concurrency).max(1);
    let total = linters.len();
    tracing::info!(total, concurrency = cap, "dispatching linter batch");

    let semaphore = Arc::new(Semaphore::new(cap));
    let mut workers: JoinSet<(usize, LinterResult)> = JoinSet::new();
    let mut in_flight: HashMap<tokio::task::Id, (usize, LinterConfig)> = HashMap::new();

    for (index, linter) in linters.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let opts = opts.clone();
        let ctx = Arc::clone(&ctx);
        let task_linter = linter.clone();
        let handle = workers.spawn(async move {
            // A closed semaphore only happens on shutdown; run unthrottled then.
            let _permit = semaphore.acquire_owned().await.ok();
            let result = execute_linter(&task_linter, &opts, &ctx).await;
            (index, result)
        });
        in_flight.insert(handle.id(), (index, linter));
    }

    let mut slots: Vec<Option<LinterResult>> = (0..total).map(|_| None).collect();
    while let Some(joined) = workers.join_next_with_id().await {
        match joined {
            Ok((id, (index, result))) => {
                in_flight.remove(&id);
                slots[index] = Some(result);
            }
            Err(e) => {
                if let Some((index, linter)) = in_flight.remove(&e.id()) {
                    tracing::error!(linter_id = %linter.id, error = %e, "linter worker died");
                    let mut result = LinterResult::new(&linter, LintStatus::Error);
                    result.error = Some(format!("worker died: {e}"));
                    slots[index] = Some(result);
                }
            }
        }
    }
    slots.into_iter().flatten().collect()
}

/// Tally a batch's results.
pub fn calculate_summary(results: &[LinterResult]) -> RunSummary {
    let mut summary = RunSummary {
        total: results.len(),
        passed: 0,
        failed: 0,
        errors: 0,
        skipped: 0,
        duration_ms: 0,
    };
    for result in results {
        match result.status {
            LintStatus::Pass => summary.passed += 1,
            LintStatus::Fail => summary.failed += 1,
            LintStatus::Error => summary.errors += 1,
            LintStatus::Skipped => summary.skipped += 1,
        }
        summary.duration_ms += result.duration_ms;
    }
    summary
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
