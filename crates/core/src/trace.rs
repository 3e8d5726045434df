// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trace/span correlation identifiers in a simplified W3C traceparent
//! encoding: `version-traceId-spanId-flags`.

use std::fmt;

const TRACE_ID_LEN: usize = 32;
const SPAN_ID_LEN: usize = 16;
const SAMPLED_FLAG: u8 = 0x01;

/// Correlation context for one execution.
///
/// A child context shares `trace_id`, records the parent's `span_id`,
/// and gets a fresh `span_id`. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    /// 32 lowercase hex characters.
    pub trace_id: String,
    /// 16 lowercase hex characters.
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub sampled: bool,
}

impl TraceContext {
    /// New root context with a random trace id, sampled.
    pub fn new() -> Self {
        Self::with_trace_id(random_hex(TRACE_ID_LEN), true)
    }

    /// New root context with a caller-supplied trace id.
    pub fn with_trace_id(trace_id: impl Into<String>, sampled: bool) -> Self {
        Self {
            trace_id: trace_id.into(),
            span_id: random_hex(SPAN_ID_LEN),
            parent_span_id: None,
            sampled,
        }
    }

    /// Child context: same trace, fresh span, parent link, inherited sampling.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: random_hex(SPAN_ID_LEN),
            parent_span_id: Some(self.span_id.clone()),
            sampled: self.sampled,
        }
    }

    /// Format as `00-<32 hex>-<16 hex>-<2 hex>`.
    pub fn to_traceparent(&self) -> String {
        format!(
            "00-{}-{}-{:02x}",
            self.trace_id,
            self.span_id,
            if self.sampled { SAMPLED_FLAG } else { 0 }
        )
    }

    /// Parse a traceparent string.
    ///
    /// Strict length and charset validation; malformed input yields
    /// `None`, never a panic. All-zero trace or span ids are rejected.
    pub fn parse_traceparent(input: &str) -> Option<Self> {
        let mut parts = input.split('-');
        let version = parts.next()?;
        let trace_id = parts.next()?;
        let span_id = parts.next()?;
        let flags = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        if !is_lower_hex(version, 2) || version == "ff" {
            return None;
        }
        if !is_lower_hex(trace_id, TRACE_ID_LEN) || is_all_zero(trace_id) {
            return None;
        }
        if !is_lower_hex(span_id, SPAN_ID_LEN) || is_all_zero(span_id) {
            return None;
        }
        if !is_lower_hex(flags, 2) {
            return None;
        }
        let flag_bits = u8::from_str_radix(flags, 16).ok()?;
        Some(Self {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
            parent_span_id: None,
            sampled: flag_bits & SAMPLED_FLAG != 0,
        })
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_traceparent())
    }
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len
        && s.bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn is_all_zero(s: &str) -> bool {
    s.bytes().all(|b| b == b'0')
}

/// Random lowercase hex string of the requested length.
fn random_hex(len: usize) -> String {
    let mut out = String::with_capacity(len);
    while out.len() < len {
        out.push_str(&uuid::Uuid::new_v4().simple().to_string());
    }
    out.truncate(len);
    out
}

#[cfg(test)]
#[path = "trace_tests.rs"]
mod tests;
