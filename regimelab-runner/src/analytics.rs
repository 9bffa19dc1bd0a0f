//! Offline analysis of telemetry logs.
//!
//! Reads a JSONL telemetry file back and summarizes how the engine behaved
//! over the session: how much time each regime claimed, how often the
//! kill switches were live, and how choppy the state machine was.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use crate::telemetry::TelemetryRecord;

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("telemetry log io: {0}")]
    Io(#[from] std::io::Error),
    #[error("telemetry log line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

/// Session-level summary of a telemetry log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySummary {
    pub total_records: usize,
    /// Percent of records spent in each behavior, keyed by tag.
    pub regime_distribution_pct: BTreeMap<String, f64>,
    /// Percent of records in a kill-switch state (EVENT_LOCK or UNDEFINED).
    pub risk_off_pct: f64,
    /// Percent of records in which each strategy class was blocked.
    pub block_rate_pct: BTreeMap<String, f64>,
    /// Behavior changes between consecutive records of the same symbol.
    pub transitions: usize,
    /// Transitions per evaluation, 0 when fewer than two records.
    pub transition_rate: f64,
    /// Records where SHADOW mode suppressed a block or throttle.
    pub shadow_interventions: usize,
}

/// Parse a JSONL telemetry file, skipping blank lines, failing on bad ones.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<TelemetryRecord>, AnalyticsError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|source| AnalyticsError::Parse { line: idx + 1, source })?;
        records.push(record);
    }
    Ok(records)
}

/// Summarize a batch of records. Transitions are counted per symbol so an
/// interleaved multi-symbol log does not inflate the churn number.
pub fn summarize(records: &[TelemetryRecord]) -> TelemetrySummary {
    let total = records.len();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut blocked_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut risk_off = 0usize;
    let mut shadow = 0usize;
    let mut last_behavior: BTreeMap<&str, &str> = BTreeMap::new();
    let mut transitions = 0usize;
    let mut pairs = 0usize;

    for record in records {
        *counts.entry(record.regime.behavior.clone()).or_default() += 1;
        if record.regime.behavior == "EVENT_LOCK" || record.regime.behavior == "UNDEFINED" {
            risk_off += 1;
        }
        // Every live check carries a decision section; an intervention was
        // suppressed only when the reason carries the SHADOW prefix.
        if record
            .shadow
            .as_ref()
            .is_some_and(|s| s.reason.starts_with("[SHADOW-"))
        {
            shadow += 1;
        }
        for strategy in &record.constraints.blocked_strategies {
            *blocked_counts.entry(strategy.clone()).or_default() += 1;
        }
        if let Some(prev) = last_behavior.insert(&record.meta.symbol, &record.regime.behavior) {
            pairs += 1;
            if prev != record.regime.behavior {
                transitions += 1;
            }
        }
    }

    let pct = |n: usize| {
        if total == 0 {
            0.0
        } else {
            n as f64 / total as f64 * 100.0
        }
    };

    TelemetrySummary {
        total_records: total,
        regime_distribution_pct: counts.iter().map(|(k, &v)| (k.clone(), pct(v))).collect(),
        risk_off_pct: pct(risk_off),
        block_rate_pct: blocked_counts
            .iter()
            .map(|(k, &v)| (k.clone(), pct(v)))
            .collect(),
        transitions,
        transition_rate: if pairs == 0 {
            0.0
        } else {
            transitions as f64 / pairs as f64
        },
        shadow_interventions: shadow,
    }
}

/// Convenience wrapper: load then summarize.
pub fn summarize_file(path: impl AsRef<Path>) -> Result<TelemetrySummary, AnalyticsError> {
    Ok(summarize(&load_records(path)?))
}
