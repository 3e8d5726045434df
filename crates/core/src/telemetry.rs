// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-execution telemetry: timestamps, byte counts, success flags,
//! and aggregate statistics over a bounded in-memory ring.

use crate::clock::{Clock, SystemClock};
use crate::trace::TraceContext;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Instant;

/// Maximum records retained before the oldest are evicted.
pub const DEFAULT_RECORD_CAPACITY: usize = 1024;

/// Closed record of one execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRecord {
    pub linter_id: String,
    pub started_at_ms: u64,
    pub duration_ms: u64,
    pub bytes: u64,
    pub success: bool,
    pub error: Option<String>,
    pub trace_id: String,
    pub span_id: String,
}

/// Open record returned by [`TelemetryCollector::start_execution`].
///
/// Consumed by `record_execution`; holding it open has no cost.
#[derive(Debug)]
pub struct PendingExecution {
    linter_id: String,
    started_at_ms: u64,
    started: Instant,
    trace_id: String,
    span_id: String,
}

/// Aggregate statistics over the retained records.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TelemetryStats {
    pub executions: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
    pub total_bytes: u64,
    /// `succeeded / executions`, 0.0 when empty.
    pub success_rate: f64,
}

/// Records execution telemetry into a bounded ring.
///
/// Exported JSON is additive/best-effort for downstream dashboards,
/// not a machine-critical schema.
pub struct TelemetryCollector<C: Clock = SystemClock> {
    clock: C,
    capacity: usize,
    records: Mutex<VecDeque<ExecutionRecord>>,
}

impl TelemetryCollector<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TelemetryCollector<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TelemetryCollector<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            capacity: DEFAULT_RECORD_CAPACITY,
            records: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Open a record for one execution.
    pub fn start_execution(&self, linter_id: &str, trace: &TraceContext) -> PendingExecution {
        PendingExecution {
            linter_id: linter_id.to_string(),
            started_at_ms: self.clock.epoch_ms(),
            started: self.clock.now(),
            trace_id: trace.trace_id.clone(),
            span_id: trace.span_id.clone(),
        }
    }

    /// Close a record into the aggregate store, evicting the oldest
    /// entry when the ring is full.
    pub fn record_execution(
        &self,
        pending: PendingExecution,
        bytes: u64,
        success: bool,
        error: Option<String>,
    ) {
        let duration_ms = self
            .clock
            .now()
            .saturating_duration_since(pending.started)
            .as_millis() as u64;
        let record = ExecutionRecord {
            linter_id: pending.linter_id,
            started_at_ms: pending.started_at_ms,
            duration_ms,
            bytes,
            success,
            error,
            trace_id: pending.trace_id,
            span_id: pending.span_id,
        };
        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    pub fn stats(&self) -> TelemetryStats {
        let records = self.records.lock();
        let executions = records.len();
        let succeeded = records.iter().filter(|r| r.success).count();
        let total_duration_ms = records.iter().map(|r| r.duration_ms).sum();
        let total_bytes = records.iter().map(|r| r.bytes).sum();
        TelemetryStats {
            executions,
            succeeded,
            failed: executions - succeeded,
            total_duration_ms,
            total_bytes,
            success_rate: if executions == 0 {
                0.0
            } else {
                succeeded as f64 / executions as f64
            },
        }
    }

    /// Export stats plus individual records as JSON.
    pub fn export(&self) -> serde_json::Value {
        let stats = self.stats();
        let records: Vec<ExecutionRecord> = self.records.lock().iter().cloned().collect();
        serde_json::json!({
            "stats": stats,
            "records": records,
        })
    }

    /// Drop all retained records (test isolation).
    pub fn reset(&self) {
        self.records.lock().clear();
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
