// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use std::time::Duration;

fn collector() -> (TelemetryCollector<FakeClock>, FakeClock) {
    let clock = FakeClock::new();
    (TelemetryCollector::with_clock(clock.clone()), clock)
}

#[test]
fn record_captures_duration_and_trace() {
    let (collector, clock) = collector();
    let trace = TraceContext::new();
    let pending = collector.start_execution("shellcheck", &trace);
    clock.advance(Duration::from_millis(250));
    collector.record_execution(pending, 1024, true, None);

    let export = collector.export();
    let records = export["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["linter_id"], "shellcheck");
    assert_eq!(records[0]["duration_ms"], 250);
    assert_eq!(records[0]["bytes"], 1024);
    assert_eq!(records[0]["trace_id"], trace.trace_id.as_str());
    assert_eq!(records[0]["span_id"], trace.span_id.as_str());
}

#[test]
fn stats_aggregate_success_and_failure() {
    let (collector, clock) = collector();
    let trace = TraceContext::new();

    let p = collector.start_execution("a", &trace);
    clock.advance(Duration::from_millis(100));
    collector.record_execution(p, 10, true, None);

    let p = collector.start_execution("b", &trace);
    clock.advance(Duration::from_millis(300));
    collector.record_execution(p, 30, false, Some("spawn failed".to_string()));

    let stats = collector.stats();
    assert_eq!(stats.executions, 2);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.total_duration_ms, 400);
    assert_eq!(stats.total_bytes, 40);
    assert!((stats.success_rate - 0.5).abs() < f64::EPSILON);
}

#[test]
fn empty_collector_has_zero_rate() {
    let (collector, _) = collector();
    let stats = collector.stats();
    assert_eq!(stats.executions, 0);
    assert_eq!(stats.success_rate, 0.0);
}

#[test]
fn ring_evicts_oldest_on_overflow() {
    let clock = FakeClock::new();
    let collector = TelemetryCollector::with_clock(clock.clone()).with_capacity(2);
    let trace = TraceContext::new();
    for id in ["first", "second", "third"] {
        let p = collector.start_execution(id, &trace);
        collector.record_execution(p, 0, true, None);
    }
    let export = collector.export();
    let records = export["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["linter_id"], "second");
    assert_eq!(records[1]["linter_id"], "third");
}

#[test]
fn reset_clears_records() {
    let (collector, _) = collector();
    let trace = TraceContext::new();
    let p = collector.start_execution("a", &trace);
    collector.record_execution(p, 0, true, None);
    collector.reset();
    assert_eq!(collector.stats().executions, 0);
}
