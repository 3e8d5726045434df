// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lintfleet-engine: parallel execution scheduling for a linter fleet.
//!
//! The engine decides for each externally supplied linter whether it
//! must run at all (incremental tracking, skip rules, result caches),
//! enforces a single concurrent engine invocation per machine, bounds
//! concurrency across spawned linter processes, retries transient
//! failures, and records telemetry for every run.

pub mod cache;
pub mod context;
pub mod executor;
pub mod lock;
pub mod orchestrator;
pub mod run_logger;
pub mod subprocess;
pub mod tracker;

pub use cache::{CacheConfig, CacheStats, ExecutionCache, SkipDecision};
pub use context::EngineContext;
pub use executor::{
    execute_linter, is_transient_error, ExecOptions, ExitCodeClassifier, ProcessRunner,
    StatusClassifier, TokioRunner, DEFAULT_MAX_RETRIES,
};
pub use lock::{acquire, ExecutionLock, LockError, LockOptions, ProcessProbe, SystemProbe};
pub use orchestrator::{
    calculate_summary, default_concurrency, execute_linters_in_parallel, RunSummary,
};
pub use run_logger::RunLogger;
pub use subprocess::{run_with_timeout, CommandOutput, SubprocessError};
pub use tracker::{
    ChangeResult, ChangeTracker, ChangeType, ExecutionDecision, TrackerStats,
    DEFAULT_DECISION_INTERVAL,
};
