//! Telemetry records and sinks.
//!
//! One record per guard evaluation, serialized as a single JSON line. Field
//! names and enum tags are the wire contract with downstream dashboards —
//! change them and every consumer breaks.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use regimelab_core::regime::{
    GateAction, GateDecision, RegimeFactors, RegimeState, StrategyClass, StrategyGate,
};

use crate::mode::RuntimeMode;

/// Round to two decimals for the wire. Full precision stays internal.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceDetail {
    pub confluence: f64,
    pub persistence: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeSection {
    pub behavior: String,
    pub bias: String,
    pub is_stable: bool,
    pub total_confidence: f64,
    pub confidence_detail: ConfidenceDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSection {
    pub trend: f64,
    pub vol_ratio: f64,
    pub liquidity: String,
    pub event: f64,
}

/// Gate verdicts for every strategy class at this snapshot, precomputed so
/// dashboards never re-derive the matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSection {
    pub blocked_strategies: Vec<String>,
    pub throttled_strategies: Vec<String>,
    pub allowed_strategies: Vec<String>,
}

/// The decision the guard actually returned for this check, together with
/// the runtime mode that produced it. Present on every record from a live
/// guard check; absent only on records assembled outside one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowSection {
    pub guard_decision: GateAction,
    pub multiplier: f64,
    pub reason: String,
    pub mode: RuntimeMode,
}

impl ShadowSection {
    /// Capture a final decision as emitted to the caller. Suppressed SHADOW
    /// interventions surface through the `[SHADOW-*]` reason prefix.
    pub fn from_decision(decision: &GateDecision, mode: RuntimeMode) -> Self {
        let guard_decision = if !decision.is_allowed {
            GateAction::Block
        } else if decision.size_multiplier < 1.0 {
            GateAction::Reduce
        } else {
            GateAction::Allow
        };
        Self {
            guard_decision,
            multiplier: decision.size_multiplier,
            reason: decision.reason.clone(),
            mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub meta: RecordMeta,
    pub regime: RegimeSection,
    pub factors: FactorSection,
    pub constraints: ConstraintSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowSection>,
}

impl TelemetryRecord {
    /// Assemble a record for one evaluation. The constraint section is built
    /// by running the gate over every strategy class.
    pub fn build(
        symbol: &str,
        timestamp: DateTime<Utc>,
        state: &RegimeState,
        factors: &RegimeFactors,
        gate: &StrategyGate,
        shadow: Option<ShadowSection>,
    ) -> Self {
        let mut blocked = Vec::new();
        let mut throttled = Vec::new();
        let mut allowed = Vec::new();
        for strategy in StrategyClass::ALL {
            let decision = gate.evaluate(state, strategy);
            let name = strategy.to_string();
            if !decision.is_allowed {
                blocked.push(name);
            } else if decision.size_multiplier < 1.0 {
                throttled.push(name);
            } else {
                allowed.push(name);
            }
        }

        Self {
            meta: RecordMeta {
                symbol: symbol.to_string(),
                timestamp,
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            regime: RegimeSection {
                behavior: state.behavior.to_string(),
                bias: state.bias.to_string(),
                is_stable: state.is_stable,
                total_confidence: round2(state.total_confidence),
                confidence_detail: ConfidenceDetail {
                    confluence: round2(state.confidence_components.confluence),
                    persistence: round2(state.confidence_components.persistence),
                    intensity: round2(state.confidence_components.intensity),
                },
            },
            factors: FactorSection {
                trend: round2(factors.trend_strength_norm),
                vol_ratio: round2(factors.volatility_ratio),
                liquidity: factors.liquidity_status.to_string(),
                event: round2(factors.event_pressure_norm),
            },
            constraints: ConstraintSection {
                blocked_strategies: blocked,
                throttled_strategies: throttled,
                allowed_strategies: allowed,
            },
            shadow,
        }
    }

    /// Compact one-line summary for live consoles. The trailing RISK_OFF
    /// marker flags kill-switch states so they stand out when scrolling.
    pub fn console_line(&self) -> String {
        let stable = if self.regime.is_stable { "Y" } else { "N" };
        let mut line = format!(
            "[REGIME] {} | Bias={} | Conf={:.2} | Stable={}",
            self.regime.behavior, self.regime.bias, self.regime.total_confidence, stable
        );
        if self.regime.behavior == "EVENT_LOCK" || self.regime.behavior == "UNDEFINED" {
            line.push_str(" | RISK_OFF");
        }
        line
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("telemetry io: {0}")]
    Io(#[from] std::io::Error),
    #[error("telemetry serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Destination for telemetry records. The guard never lets a sink failure
/// surface into a trading decision.
pub trait TelemetrySink: Send {
    fn emit(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError>;
}

/// Appends one JSON line per record to a file.
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, TelemetryError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl TelemetrySink for JsonlSink {
    fn emit(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory sink with a shared buffer; clone one handle into the guard and
/// keep another to inspect what was emitted.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<TelemetryRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TelemetryRecord> {
        // A panic in another holder must not cascade into the guard.
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl TelemetrySink for MemorySink {
    fn emit(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    fn emit(&mut self, _record: &TelemetryRecord) -> Result<(), TelemetryError> {
        Ok(())
    }
}
