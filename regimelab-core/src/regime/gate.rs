//! Strategy gate — allow/reduce/block per (strategy class, behavior).
//!
//! Two global kill switches run before the table: EVENT_LOCK and UNDEFINED
//! deny every strategy outright. The table itself is a whitelist realized as
//! an exhaustive two-enum match, so adding a behavior or strategy class is a
//! compile-time-checked change.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::regime::types::{MarketBehavior, RegimeState};

/// Closed set of strategy categories whose regime compatibility is looked
/// up, not computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyClass {
    Momentum,
    MeanReversion,
    Scalping,
    Event,
}

impl StrategyClass {
    pub const ALL: [StrategyClass; 4] = [
        StrategyClass::Momentum,
        StrategyClass::MeanReversion,
        StrategyClass::Scalping,
        StrategyClass::Event,
    ];
}

impl fmt::Display for StrategyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StrategyClass::Momentum => "MOMENTUM",
            StrategyClass::MeanReversion => "MEAN_REVERSION",
            StrategyClass::Scalping => "SCALPING",
            StrategyClass::Event => "EVENT",
        })
    }
}

/// Verdict for one (strategy, behavior) cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateAction {
    Allow,
    Reduce,
    Block,
}

impl GateAction {
    pub fn size_multiplier(self) -> f64 {
        match self {
            GateAction::Allow => 1.0,
            GateAction::Reduce => 0.5,
            GateAction::Block => 0.0,
        }
    }
}

/// The verdict returned to a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub is_allowed: bool,
    pub size_multiplier: f64,
    pub reason: String,
}

/// Declarative compatibility of every strategy class with every behavior.
///
/// Kill-switch rows (EVENT_LOCK, UNDEFINED) are listed as BLOCK for
/// completeness even though `StrategyGate` denies them before the lookup.
pub fn compatibility(strategy: StrategyClass, behavior: MarketBehavior) -> GateAction {
    use GateAction::*;
    use MarketBehavior::*;

    match strategy {
        StrategyClass::Momentum => match behavior {
            TrendingNormalVol => Allow,
            TrendingHighVol => Reduce,
            MeanRevertingLowVol | MeanRevertingHighVol | EventDominant => Block,
            EventLock | Undefined => Block,
        },
        StrategyClass::MeanReversion => match behavior {
            MeanRevertingLowVol => Allow,
            MeanRevertingHighVol => Reduce,
            TrendingNormalVol | TrendingHighVol | EventDominant => Block,
            EventLock | Undefined => Block,
        },
        // Scalping's edge comes from volatility itself: allowed in every
        // quadrant, merely reduced when an event dominates.
        StrategyClass::Scalping => match behavior {
            TrendingNormalVol | TrendingHighVol | MeanRevertingLowVol | MeanRevertingHighVol => {
                Allow
            }
            EventDominant => Reduce,
            EventLock | Undefined => Block,
        },
        StrategyClass::Event => match behavior {
            EventDominant => Allow,
            TrendingNormalVol | TrendingHighVol | MeanRevertingLowVol | MeanRevertingHighVol => {
                Block
            }
            EventLock | Undefined => Block,
        },
    }
}

/// Gatekeeper enforcing regime constraints on strategies.
#[derive(Debug, Clone, Default)]
pub struct StrategyGate;

impl StrategyGate {
    pub fn new() -> Self {
        Self
    }

    /// Map a confirmed regime and a strategy class to a gate decision.
    pub fn evaluate(&self, regime: &RegimeState, strategy: StrategyClass) -> GateDecision {
        match regime.behavior {
            MarketBehavior::EventLock => {
                return GateDecision {
                    is_allowed: false,
                    size_multiplier: 0.0,
                    reason: "BLOCKED: market is in EVENT_LOCK.".to_string(),
                };
            }
            MarketBehavior::Undefined => {
                return GateDecision {
                    is_allowed: false,
                    size_multiplier: 0.0,
                    reason: "BLOCKED: market regime UNDEFINED (risk off).".to_string(),
                };
            }
            _ => {}
        }

        let action = compatibility(strategy, regime.behavior);
        let behavior = regime.behavior;
        match action {
            GateAction::Allow => GateDecision {
                is_allowed: true,
                size_multiplier: 1.0,
                reason: format!("ALLOWED: {strategy} compatible with {behavior}."),
            },
            GateAction::Reduce => GateDecision {
                is_allowed: true,
                size_multiplier: 0.5,
                reason: format!("REDUCED: {strategy} risk reduced in {behavior}."),
            },
            GateAction::Block => GateDecision {
                is_allowed: false,
                size_multiplier: 0.0,
                reason: format!("BLOCKED: {strategy} incompatible with {behavior}."),
            },
        }
    }
}
