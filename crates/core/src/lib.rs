// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lintfleet-core: shared types for the lintfleet execution engine.
//!
//! Pure domain types and instrumentation primitives: linter descriptors
//! and results, the clock abstraction, trace-context propagation, and
//! the telemetry collector. No subprocess or filesystem I/O lives here.

pub mod clock;
pub mod linter;
pub mod telemetry;
pub mod trace;

pub use clock::{Clock, FakeClock, SystemClock};
pub use linter::{LintStatus, LinterConfig, LinterResult, SkipCheck, VersionProbe};
pub use telemetry::{
    ExecutionRecord, PendingExecution, TelemetryCollector, TelemetryStats, DEFAULT_RECORD_CAPACITY,
};
pub use trace::TraceContext;
