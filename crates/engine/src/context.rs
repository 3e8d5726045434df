// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine context: the cache, tracker, and telemetry instances shared
//! by one engine invocation.
//!
//! Constructed once at process start and passed by reference; there is
//! no module-level singleton. `reset()` restores a pristine state for
//! test isolation.

use crate::cache::{CacheConfig, ExecutionCache};
use crate::tracker::ChangeTracker;
use lintfleet_core::clock::{Clock, SystemClock};
use lintfleet_core::telemetry::TelemetryCollector;
use std::path::PathBuf;

pub struct EngineContext<C: Clock = SystemClock> {
    pub cache: ExecutionCache<C>,
    pub tracker: ChangeTracker<C>,
    pub telemetry: TelemetryCollector<C>,
}

impl EngineContext<SystemClock> {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self::with_clock(repo_root, SystemClock)
    }
}

impl<C: Clock> EngineContext<C> {
    pub fn with_clock(repo_root: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            cache: ExecutionCache::with_clock(CacheConfig::default(), clock.clone()),
            tracker: ChangeTracker::with_clock(repo_root, clock.clone()),
            telemetry: TelemetryCollector::with_clock(clock),
        }
    }

    /// Drop all cached state and telemetry records.
    pub fn reset(&self) {
        self.cache.clear();
        self.tracker.clear();
        self.telemetry.reset();
    }
}
