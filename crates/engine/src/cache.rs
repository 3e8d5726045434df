// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-tier result cache keyed by linter id.
//!
//! Three independent TTL-bounded maps: binary presence, observed
//! version text, and skip decisions. Expiry is lazy; there is no
//! background sweep. Skip decisions are additionally pinned to the
//! git-state hash captured at set-time and miss on any mismatch,
//! including an empty current hash (hashing currently unavailable).

use lintfleet_core::clock::{Clock, SystemClock};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Per-map TTLs.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub binary_ttl: Duration,
    pub version_ttl: Duration,
    pub skip_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            binary_ttl: Duration::from_secs(300),
            version_ttl: Duration::from_secs(3600),
            skip_ttl: Duration::from_secs(60),
        }
    }
}

/// Cached outcome of the rule-based skip check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipDecision {
    pub skip: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    stored_at_ms: u64,
}

#[derive(Debug, Clone)]
struct SkipEntry {
    value: SkipDecision,
    stored_at_ms: u64,
    hash: String,
}

/// Per-map entry counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub binaries: usize,
    pub versions: usize,
    pub skip_decisions: usize,
    pub total: usize,
}

/// Process-local execution cache.
///
/// Guarded by per-map mutexes; safe under the multi-threaded tokio
/// scheduler.
pub struct ExecutionCache<C: Clock = SystemClock> {
    config: CacheConfig,
    clock: C,
    binaries: Mutex<HashMap<String, Entry<bool>>>,
    versions: Mutex<HashMap<String, Entry<String>>>,
    skips: Mutex<HashMap<String, SkipEntry>>,
}

impl ExecutionCache<SystemClock> {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for ExecutionCache<SystemClock> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<C: Clock> ExecutionCache<C> {
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            binaries: Mutex::new(HashMap::new()),
            versions: Mutex::new(HashMap::new()),
            skips: Mutex::new(HashMap::new()),
        }
    }

    fn fresh(&self, stored_at_ms: u64, ttl: Duration) -> bool {
        self.clock.epoch_ms().saturating_sub(stored_at_ms) < ttl.as_millis() as u64
    }

    /// Cached binary-presence result, or `None` past TTL.
    pub fn get_binary(&self, linter_id: &str) -> Option<bool> {
        let map = self.binaries.lock();
        let entry = map.get(linter_id)?;
        self.fresh(entry.stored_at_ms, self.config.binary_ttl)
            .then_some(entry.value)
    }

    pub fn set_binary(&self, linter_id: &str, present: bool) {
        self.binaries.lock().insert(
            linter_id.to_string(),
            Entry {
                value: present,
                stored_at_ms: self.clock.epoch_ms(),
            },
        );
    }

    /// Cached observed version text, or `None` past TTL.
    pub fn get_version(&self, linter_id: &str) -> Option<String> {
        let map = self.versions.lock();
        let entry = map.get(linter_id)?;
        self.fresh(entry.stored_at_ms, self.config.version_ttl)
            .then(|| entry.value.clone())
    }

    pub fn set_version(&self, linter_id: &str, observed: impl Into<String>) {
        self.versions.lock().insert(
            linter_id.to_string(),
            Entry {
                value: observed.into(),
                stored_at_ms: self.clock.epoch_ms(),
            },
        );
    }

    /// Cached skip decision, valid only while both the TTL holds and
    /// `current_hash` matches the hash captured at set-time. An empty
    /// `current_hash` always misses.
    pub fn get_skip_decision(&self, linter_id: &str, current_hash: &str) -> Option<SkipDecision> {
        let map = self.skips.lock();
        let entry = map.get(linter_id)?;
        if !self.fresh(entry.stored_at_ms, self.config.skip_ttl) {
            return None;
        }
        if current_hash.is_empty() || entry.hash != current_hash {
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn set_skip_decision(&self, linter_id: &str, decision: SkipDecision, hash: impl Into<String>) {
        self.skips.lock().insert(
            linter_id.to_string(),
            SkipEntry {
                value: decision,
                stored_at_ms: self.clock.epoch_ms(),
                hash: hash.into(),
            },
        );
    }

    pub fn clear_binaries(&self) {
        self.binaries.lock().clear();
    }

    pub fn clear_versions(&self) {
        self.versions.lock().clear();
    }

    pub fn clear_skip_decisions(&self) {
        self.skips.lock().clear();
    }

    pub fn clear(&self) {
        self.clear_binaries();
        self.clear_versions();
        self.clear_skip_decisions();
    }

    pub fn stats(&self) -> CacheStats {
        let binaries = self.binaries.lock().len();
        let versions = self.versions.lock().len();
        let skip_decisions = self.skips.lock().len();
        CacheStats {
            binaries,
            versions,
            skip_decisions,
            total: binaries + versions + skip_decisions,
        }
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
