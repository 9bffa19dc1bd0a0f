//! Integration guard — the single entry point a trading host calls before
//! acting on a signal.
//!
//! The guard wires the pipeline, per-symbol state machines, the gate, and
//! telemetry into one infallible call. It never panics on market data and
//! never lets a telemetry failure alter a trading decision. When in doubt
//! (thin history) it denies.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use regimelab_core::config::RegimeConfig;
use regimelab_core::domain::{Bar, EconomicEvent, Symbol};
use regimelab_core::regime::{
    GateDecision, RegimeFactors, RegimePipeline, RegimeState, StateManager, StrategyClass,
    StrategyGate,
};

use crate::mode::RuntimeMode;
use crate::telemetry::{ShadowSection, TelemetryRecord, TelemetrySink};

/// Cached per-symbol machinery plus the last confirmed state, keyed by the
/// bar close that produced it.
struct SymbolEntry {
    manager: StateManager,
    last_bar_close: Option<DateTime<Utc>>,
    last_state: Option<RegimeState>,
}

pub struct RegimeGuard {
    config: RegimeConfig,
    pipeline: RegimePipeline,
    gate: StrategyGate,
    entries: HashMap<Symbol, SymbolEntry>,
    // Insertion order for FIFO eviction once the cache is full.
    arrival: VecDeque<Symbol>,
    sink: Box<dyn TelemetrySink>,
}

impl RegimeGuard {
    pub fn new(config: RegimeConfig, sink: Box<dyn TelemetrySink>) -> Self {
        info!(
            fingerprint = %config.fingerprint(),
            "regime guard initialized"
        );
        Self {
            pipeline: RegimePipeline::from_config(&config),
            gate: StrategyGate::new(),
            entries: HashMap::new(),
            arrival: VecDeque::new(),
            sink,
            config,
        }
    }

    /// Number of symbols currently holding a state machine.
    pub fn cached_symbols(&self) -> usize {
        self.entries.len()
    }

    /// Confirmed regime for a symbol, if one has been evaluated.
    pub fn regime_of(&self, symbol: &str) -> Option<regimelab_core::regime::MarketBehavior> {
        self.entries.get(symbol).map(|e| e.manager.current_behavior())
    }

    /// Decide whether `strategy` may act on `symbol` given the trailing bar
    /// window and the known event calendar.
    ///
    /// `bars` must be ordered oldest to newest with the live bar last.
    pub fn check(
        &mut self,
        symbol: &str,
        bars: &[Bar],
        events: &[EconomicEvent],
        strategy: StrategyClass,
        mode: RuntimeMode,
    ) -> GateDecision {
        if mode == RuntimeMode::Off {
            return GateDecision {
                is_allowed: true,
                size_multiplier: 1.0,
                reason: "OFF: regime engine disabled.".to_string(),
            };
        }

        if bars.len() < self.config.min_history_bars {
            return GateDecision {
                is_allowed: false,
                size_multiplier: 0.0,
                reason: format!(
                    "BLOCKED: FAIL_SAFE insufficient history ({} < {}).",
                    bars.len(),
                    self.config.min_history_bars
                ),
            };
        }

        let (state, factors) = self.evaluate_symbol(symbol, bars, events);

        let enforced = self.gate.evaluate(&state, strategy);
        let decision = apply_mode(enforced, mode);

        // Timestamp telemetry with the bar close so replayed history lines
        // up with live emission. Every live check carries the decision the
        // caller received and the mode that produced it.
        let timestamp = bars[bars.len() - 1].timestamp;
        let shadow = ShadowSection::from_decision(&decision, mode);
        let record =
            TelemetryRecord::build(symbol, timestamp, &state, &factors, &self.gate, Some(shadow));
        if let Err(err) = self.sink.emit(&record) {
            warn!(symbol, error = %err, "telemetry emission failed");
        }

        decision
    }

    /// Evaluate the regime without gating a strategy, for hosts that only
    /// want the classification.
    pub fn observe(
        &mut self,
        symbol: &str,
        bars: &[Bar],
        events: &[EconomicEvent],
    ) -> Option<RegimeState> {
        if bars.len() < self.config.min_history_bars {
            return None;
        }
        let (state, _) = self.evaluate_symbol(symbol, bars, events);
        Some(state)
    }

    /// Observe the window and advance the symbol's state machine — once per
    /// market bar. Re-checking the same closed bar (another strategy against
    /// the identical window) reuses the confirmed state instead of
    /// double-counting hysteresis and cooldown.
    fn evaluate_symbol(
        &mut self,
        symbol: &str,
        bars: &[Bar],
        events: &[EconomicEvent],
    ) -> (RegimeState, RegimeFactors) {
        if !self.entries.contains_key(symbol) {
            self.admit_symbol(symbol, bars, events);
        }
        let (raw, factors) = self.pipeline.observe(bars, events);
        let close = bars[bars.len() - 1].timestamp;
        let entry = self
            .entries
            .get_mut(symbol)
            .expect("symbol admitted above");

        if entry.last_bar_close == Some(close) {
            if let Some(state) = entry.last_state.clone() {
                return (state, factors);
            }
        }

        let state = entry.manager.update(raw, &factors);
        entry.last_bar_close = Some(close);
        entry.last_state = Some(state.clone());
        (state, factors)
    }

    /// First sight of a symbol: create its state machine and replay the
    /// recent window through it so hysteresis does not start cold.
    fn admit_symbol(&mut self, symbol: &str, bars: &[Bar], events: &[EconomicEvent]) {
        let mut manager = StateManager::from_config(&self.config);

        // Replay growing prefixes that stop short of the live bar; the live
        // bar is consumed by the regular update that follows admission.
        let replay = self.config.warmup_replay_bars.min(bars.len().saturating_sub(1));
        let window: Vec<_> = (0..replay)
            .map(|k| {
                let end = bars.len() - replay + k;
                self.pipeline.observe(&bars[..end], events)
            })
            .collect();
        manager.warm_up(&window);

        if self.entries.len() >= self.config.max_cached_symbols {
            if let Some(evicted) = self.arrival.pop_front() {
                self.entries.remove(&evicted);
                warn!(symbol = %evicted, "evicted regime state, symbol cache full");
            }
        }
        self.entries.insert(
            symbol.to_string(),
            SymbolEntry {
                manager,
                last_bar_close: None,
                last_state: None,
            },
        );
        self.arrival.push_back(symbol.to_string());
    }
}

/// Apply the runtime mode to an enforced decision. SHADOW records what would
/// have happened but always permits.
fn apply_mode(enforced: GateDecision, mode: RuntimeMode) -> GateDecision {
    if mode != RuntimeMode::Shadow || (enforced.is_allowed && enforced.size_multiplier >= 1.0) {
        return enforced;
    }

    let prefix = if enforced.is_allowed {
        "[SHADOW-THROTTLE] "
    } else {
        "[SHADOW-BLOCK] "
    };
    GateDecision {
        is_allowed: true,
        size_multiplier: 1.0,
        reason: format!("{prefix}{}", enforced.reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regimelab_core::regime::MarketBehavior;

    fn allowed() -> GateDecision {
        GateDecision {
            is_allowed: true,
            size_multiplier: 1.0,
            reason: "ALLOWED: fine.".to_string(),
        }
    }

    fn blocked() -> GateDecision {
        GateDecision {
            is_allowed: false,
            size_multiplier: 0.0,
            reason: "BLOCKED: no.".to_string(),
        }
    }

    fn reduced() -> GateDecision {
        GateDecision {
            is_allowed: true,
            size_multiplier: 0.5,
            reason: "REDUCED: careful.".to_string(),
        }
    }

    #[test]
    fn enforced_mode_passes_decisions_through() {
        let d = apply_mode(blocked(), RuntimeMode::Enforced);
        assert!(!d.is_allowed);
        assert_eq!(d, blocked());
    }

    #[test]
    fn shadow_mode_suppresses_blocks() {
        let d = apply_mode(blocked(), RuntimeMode::Shadow);
        assert!(d.is_allowed);
        assert_eq!(d.size_multiplier, 1.0);
        assert!(d.reason.starts_with("[SHADOW-BLOCK] "));
        assert!(d.reason.ends_with("BLOCKED: no."));
    }

    #[test]
    fn shadow_mode_suppresses_throttles() {
        let d = apply_mode(reduced(), RuntimeMode::Shadow);
        assert!(d.is_allowed);
        assert_eq!(d.size_multiplier, 1.0);
        assert!(d.reason.starts_with("[SHADOW-THROTTLE] "));
    }

    #[test]
    fn shadow_mode_leaves_clean_allows_alone() {
        let d = apply_mode(allowed(), RuntimeMode::Shadow);
        assert_eq!(d, allowed());
    }

    #[test]
    fn cache_evicts_oldest_symbol_first() {
        let mut config = RegimeConfig::default();
        config.max_cached_symbols = 2;
        config.min_history_bars = 5;
        config.warmup_replay_bars = 2;
        let mut guard = RegimeGuard::new(config, Box::new(crate::telemetry::NoopSink));

        let bars = test_bars(10);
        for symbol in ["A", "B", "C"] {
            guard.check(symbol, &bars, &[], StrategyClass::Scalping, RuntimeMode::Enforced);
        }
        assert_eq!(guard.cached_symbols(), 2);
        assert!(guard.regime_of("A").is_none());
        assert!(guard.regime_of("B").is_some());
        assert!(guard.regime_of("C").is_some());
    }

    #[test]
    fn observe_reports_without_gating() {
        let mut config = RegimeConfig::default();
        config.min_history_bars = 5;
        config.warmup_replay_bars = 2;
        let mut guard = RegimeGuard::new(config, Box::new(crate::telemetry::NoopSink));

        assert!(guard.observe("ES", &test_bars(3), &[]).is_none());
        let state = guard.observe("ES", &test_bars(10), &[]).unwrap();
        assert_eq!(state.behavior, guard.regime_of("ES").unwrap());
        assert_ne!(state.behavior, MarketBehavior::EventLock);
    }

    fn test_bars(n: usize) -> Vec<Bar> {
        use chrono::{Duration, TimeZone, Utc};
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + (i % 2) as f64 * 0.1;
                Bar {
                    symbol: "TEST".to_string(),
                    timestamp: base + Duration::minutes(i as i64),
                    open: close,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 1000,
                }
            })
            .collect()
    }
}
