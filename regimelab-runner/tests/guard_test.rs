//! Guard behavior end to end: fail-safe, runtime modes, gating, and the
//! telemetry records emitted along the way.

use chrono::{DateTime, Duration, TimeZone, Utc};
use regimelab_core::config::RegimeConfig;
use regimelab_core::domain::{Bar, EconomicEvent};
use regimelab_core::regime::{GateAction, MarketBehavior, StrategyClass};
use regimelab_runner::telemetry::MemorySink;
use regimelab_runner::{RegimeGuard, RuntimeMode};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap()
}

/// Choppy tape with small constant ranges: classifies MEAN_REVERTING_LOW_VOL.
fn quiet_tape(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let close = 100.0 + if i % 2 == 0 { 0.05 } else { -0.05 };
            Bar {
                symbol: "ES".to_string(),
                timestamp: base_time() + Duration::minutes(i as i64),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1000,
            }
        })
        .collect()
}

fn guard_with_sink() -> (RegimeGuard, MemorySink) {
    let sink = MemorySink::new();
    let guard = RegimeGuard::new(RegimeConfig::default(), Box::new(sink.clone()));
    (guard, sink)
}

#[test]
fn thin_history_denies_fail_safe() {
    let (mut guard, sink) = guard_with_sink();
    let bars = quiet_tape(20);

    let decision = guard.check("ES", &bars, &[], StrategyClass::Momentum, RuntimeMode::Enforced);
    assert!(!decision.is_allowed);
    assert_eq!(decision.size_multiplier, 0.0);
    assert!(decision.reason.contains("FAIL_SAFE"), "{}", decision.reason);

    // Nothing was evaluated, so nothing was emitted or cached.
    assert!(sink.records().is_empty());
    assert_eq!(guard.cached_symbols(), 0);
}

#[test]
fn off_mode_bypasses_the_engine() {
    let (mut guard, sink) = guard_with_sink();

    // Even a two-bar history passes: OFF short-circuits before fail-safe.
    let decision = guard.check(
        "ES",
        &quiet_tape(2),
        &[],
        StrategyClass::Momentum,
        RuntimeMode::Off,
    );
    assert!(decision.is_allowed);
    assert_eq!(decision.size_multiplier, 1.0);
    assert!(sink.records().is_empty());
}

#[test]
fn quiet_tape_blocks_momentum_and_allows_mean_reversion() {
    let (mut guard, _sink) = guard_with_sink();
    let bars = quiet_tape(100);

    let momentum = guard.check("ES", &bars, &[], StrategyClass::Momentum, RuntimeMode::Enforced);
    assert!(!momentum.is_allowed);
    assert!(momentum.reason.contains("MOMENTUM incompatible"), "{}", momentum.reason);

    let mean_rev = guard.check(
        "ES",
        &bars,
        &[],
        StrategyClass::MeanReversion,
        RuntimeMode::Enforced,
    );
    assert!(mean_rev.is_allowed);
    assert_eq!(mean_rev.size_multiplier, 1.0);

    assert_eq!(
        guard.regime_of("ES"),
        Some(MarketBehavior::MeanRevertingLowVol)
    );
}

#[test]
fn imminent_event_blocks_everything_when_enforced() {
    let (mut guard, _sink) = guard_with_sink();
    let bars = quiet_tape(100);
    let event = EconomicEvent::new(
        bars.last().unwrap().timestamp + Duration::minutes(5),
        1.0,
        "FOMC",
    );

    for strategy in StrategyClass::ALL {
        let decision = guard.check("ES", &bars, &[event.clone()], strategy, RuntimeMode::Enforced);
        assert!(!decision.is_allowed, "{strategy} allowed under event lock");
        assert!(decision.reason.contains("EVENT_LOCK"), "{}", decision.reason);
    }
    assert_eq!(guard.regime_of("ES"), Some(MarketBehavior::EventLock));
}

#[test]
fn shadow_mode_permits_but_records_the_block() {
    let (mut guard, sink) = guard_with_sink();
    let bars = quiet_tape(100);

    // Momentum in a mean-reverting regime would be blocked when enforced.
    let decision = guard.check("ES", &bars, &[], StrategyClass::Momentum, RuntimeMode::Shadow);
    assert!(decision.is_allowed);
    assert_eq!(decision.size_multiplier, 1.0);
    assert!(decision.reason.starts_with("[SHADOW-BLOCK] "), "{}", decision.reason);

    // The record carries the decision the caller actually received; the
    // suppressed block survives in the reason prefix.
    let records = sink.records();
    assert_eq!(records.len(), 1);
    let shadow = records[0].shadow.as_ref().expect("decision section present");
    assert_eq!(shadow.guard_decision, GateAction::Allow);
    assert_eq!(shadow.multiplier, 1.0);
    assert_eq!(shadow.mode, RuntimeMode::Shadow);
    assert!(shadow.reason.starts_with("[SHADOW-BLOCK] "));
    assert!(shadow.reason.contains("MOMENTUM incompatible"));
}

#[test]
fn shadow_mode_leaves_compatible_strategies_untouched() {
    let (mut guard, sink) = guard_with_sink();
    let bars = quiet_tape(100);

    let decision = guard.check(
        "ES",
        &bars,
        &[],
        StrategyClass::MeanReversion,
        RuntimeMode::Shadow,
    );
    assert!(decision.is_allowed);
    assert!(decision.reason.starts_with("ALLOWED"), "{}", decision.reason);

    // A clean allow still records what was returned, without any prefix.
    let records = sink.records();
    let shadow = records[0].shadow.as_ref().expect("decision section present");
    assert_eq!(shadow.guard_decision, GateAction::Allow);
    assert_eq!(shadow.mode, RuntimeMode::Shadow);
    assert!(shadow.reason.starts_with("ALLOWED"));
}

#[test]
fn telemetry_record_carries_the_full_snapshot() {
    let (mut guard, sink) = guard_with_sink();
    let bars = quiet_tape(100);

    guard.check("ES", &bars, &[], StrategyClass::Scalping, RuntimeMode::Enforced);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];

    assert_eq!(record.meta.symbol, "ES");
    assert_eq!(record.meta.timestamp, bars.last().unwrap().timestamp);
    assert_eq!(record.regime.behavior, "MEAN_REVERTING_LOW_VOL");
    assert_eq!(record.factors.liquidity, "NORMAL");
    assert!(record
        .constraints
        .allowed_strategies
        .contains(&"MEAN_REVERSION".to_string()));
    assert!(record
        .constraints
        .blocked_strategies
        .contains(&"MOMENTUM".to_string()));
    assert!((0.0..=1.0).contains(&record.regime.total_confidence));

    // Enforced checks carry their mode and final decision too.
    let shadow = record.shadow.as_ref().expect("decision section present");
    assert_eq!(shadow.mode, RuntimeMode::Enforced);
    assert_eq!(shadow.guard_decision, GateAction::Allow);
    assert_eq!(shadow.multiplier, 1.0);
}

#[test]
fn enforced_block_is_recorded_in_telemetry() {
    let (mut guard, sink) = guard_with_sink();
    let bars = quiet_tape(100);

    let decision = guard.check("ES", &bars, &[], StrategyClass::Momentum, RuntimeMode::Enforced);
    assert!(!decision.is_allowed);

    let records = sink.records();
    let shadow = records[0].shadow.as_ref().expect("decision section present");
    assert_eq!(shadow.mode, RuntimeMode::Enforced);
    assert_eq!(shadow.guard_decision, GateAction::Block);
    assert_eq!(shadow.multiplier, 0.0);
    assert_eq!(shadow.reason, decision.reason);
}

#[test]
fn same_bar_rechecks_do_not_advance_the_state_machine() {
    let mut config = RegimeConfig::default();
    config.warmup_replay_bars = 0;
    let sink = MemorySink::new();
    let mut guard = RegimeGuard::new(config, Box::new(sink.clone()));
    let bars = quiet_tape(60);

    // Three strategies against the identical closed bar count as one update:
    // the calm candidate needs three distinct bars, so no switch yet.
    for strategy in [
        StrategyClass::Momentum,
        StrategyClass::MeanReversion,
        StrategyClass::Scalping,
    ] {
        guard.check("ES", &bars[..50], &[], strategy, RuntimeMode::Enforced);
    }
    assert_eq!(guard.regime_of("ES"), Some(MarketBehavior::Undefined));

    // Re-checks report the same confirmed state and confidence.
    let records = sink.records();
    assert_eq!(records[0].regime, records[1].regime);
    assert_eq!(records[1].regime, records[2].regime);

    // Two fresh bars supply the remaining confirmations.
    guard.check("ES", &bars[..51], &[], StrategyClass::Scalping, RuntimeMode::Enforced);
    guard.check("ES", &bars[..52], &[], StrategyClass::Scalping, RuntimeMode::Enforced);
    assert_eq!(
        guard.regime_of("ES"),
        Some(MarketBehavior::MeanRevertingLowVol)
    );
}

#[test]
fn cooldown_after_event_lock_keeps_denying() {
    let mut config = RegimeConfig::default();
    config.cooldown_bars = 3;
    let mut guard = RegimeGuard::new(config, Box::new(MemorySink::new()));

    let bars = quiet_tape(140);
    let event = EconomicEvent::new(bars[99].timestamp + Duration::minutes(5), 1.0, "NFP");
    let events = [event];

    // Lock while the event is imminent.
    let decision = guard.check(
        "ES",
        &bars[..100],
        &events,
        StrategyClass::MeanReversion,
        RuntimeMode::Enforced,
    );
    assert!(!decision.is_allowed);
    assert_eq!(guard.regime_of("ES"), Some(MarketBehavior::EventLock));

    // The event is now in the past and the tape reads calm again, but the
    // cooldown degrades those reads: still denied, now as UNDEFINED.
    for k in 0..3 {
        let decision = guard.check(
            "ES",
            &bars[..110 + k],
            &events,
            StrategyClass::MeanReversion,
            RuntimeMode::Enforced,
        );
        assert!(!decision.is_allowed, "allowed during cooldown at update {k}");
        assert!(decision.reason.contains("UNDEFINED"), "{}", decision.reason);
        assert_eq!(guard.regime_of("ES"), Some(MarketBehavior::Undefined));
    }

    // Cooldown over: the calm regime needs its three confirmations, then
    // mean reversion trades again.
    let mut last = None;
    for k in 3..6 {
        last = Some(guard.check(
            "ES",
            &bars[..110 + k],
            &events,
            StrategyClass::MeanReversion,
            RuntimeMode::Enforced,
        ));
    }
    let decision = last.unwrap();
    assert!(decision.is_allowed, "{}", decision.reason);
    assert_eq!(decision.size_multiplier, 1.0);
    assert_eq!(
        guard.regime_of("ES"),
        Some(MarketBehavior::MeanRevertingLowVol)
    );
}

#[test]
fn separate_symbols_hold_separate_state() {
    let (mut guard, _sink) = guard_with_sink();
    let quiet = quiet_tape(100);
    let event = EconomicEvent::new(
        quiet.last().unwrap().timestamp + Duration::minutes(5),
        1.0,
        "CPI",
    );

    guard.check("ES", &quiet, &[], StrategyClass::Scalping, RuntimeMode::Enforced);
    guard.check("NQ", &quiet, &[event], StrategyClass::Scalping, RuntimeMode::Enforced);

    assert_eq!(
        guard.regime_of("ES"),
        Some(MarketBehavior::MeanRevertingLowVol)
    );
    assert_eq!(guard.regime_of("NQ"), Some(MarketBehavior::EventLock));
    assert_eq!(guard.cached_symbols(), 2);
}
