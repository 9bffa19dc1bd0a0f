//! Hysteresis/cooldown state machine producing the confirmed regime.
//!
//! One instance per symbol; calls must be serialized by the owner. The
//! machine starts in `UNDEFINED` and never terminates — `UNDEFINED` stays
//! reachable at any time.
//!
//! Confirmation counts are asymmetric: risk-off states confirm fast
//! (default 1), the full risk-on state confirms slow (default 5), everything
//! else sits in between (default 3). Bias is a secondary attribute and is
//! adopted immediately whenever behavior matches; it is not subject to
//! hysteresis.

use crate::config::RegimeConfig;
use crate::regime::types::{
    ConfidenceComponents, DirectionalBias, MarketBehavior, RawRegime, RegimeFactors, RegimeState,
};

/// Persistence counter value at which the persistence score saturates.
const PERSISTENCE_CAP: f64 = 50.0;

/// Persistence counter above which the confirmed state counts as stable.
const STABLE_AFTER: u32 = 5;

#[derive(Debug, Clone)]
pub struct StateManager {
    hysteresis_risk_on: u32,
    hysteresis_risk_off: u32,
    hysteresis_default: u32,
    cooldown_bars: u32,

    current_behavior: MarketBehavior,
    current_bias: DirectionalBias,
    pending_behavior: Option<MarketBehavior>,
    pending_counter: u32,
    persistence_counter: u32,
    cooldown_timer: u32,
}

impl StateManager {
    pub fn from_config(config: &RegimeConfig) -> Self {
        Self {
            hysteresis_risk_on: config.hysteresis_risk_on,
            hysteresis_risk_off: config.hysteresis_risk_off,
            hysteresis_default: config.hysteresis_default,
            cooldown_bars: config.cooldown_bars,
            current_behavior: MarketBehavior::Undefined,
            current_bias: DirectionalBias::Neutral,
            pending_behavior: None,
            pending_counter: 0,
            persistence_counter: 0,
            cooldown_timer: 0,
        }
    }

    pub fn current_behavior(&self) -> MarketBehavior {
        self.current_behavior
    }

    pub fn pending(&self) -> Option<(MarketBehavior, u32)> {
        self.pending_behavior.map(|b| (b, self.pending_counter))
    }

    pub fn cooldown_active(&self) -> bool {
        self.cooldown_timer > 0
    }

    /// Replay a pre-computed observation window in order, returning the final
    /// confirmed state. This reconstructs hysteresis/cooldown state
    /// deterministically from data alone after a restart.
    pub fn warm_up(&mut self, window: &[(RawRegime, RegimeFactors)]) -> Option<RegimeState> {
        let mut last = None;
        for (raw, factors) in window {
            last = Some(self.update(*raw, factors));
        }
        last
    }

    /// Advance the machine by one observation and return the confirmed state.
    pub fn update(&mut self, raw: RawRegime, factors: &RegimeFactors) -> RegimeState {
        let raw = self.apply_cooldown(raw);

        let required = self.required_confirmations(raw.behavior);

        if raw.behavior == self.current_behavior {
            self.persistence_counter += 1;
            self.pending_behavior = None;
            self.pending_counter = 0;
            // Bias tracks the raw read immediately.
            self.current_bias = raw.bias;
        } else {
            if self.pending_behavior == Some(raw.behavior) {
                self.pending_counter += 1;
            } else {
                self.pending_behavior = Some(raw.behavior);
                self.pending_counter = 1;
            }
            if self.pending_counter >= required {
                self.switch_to(raw.behavior, raw.bias);
            }
        }

        let confidence = self.confidence(&raw, factors);
        RegimeState {
            behavior: self.current_behavior,
            bias: self.current_bias,
            total_confidence: confidence.total(),
            confidence_components: confidence,
            is_stable: self.persistence_counter > STABLE_AFTER,
        }
    }

    /// Cooldown bookkeeping, applied before hysteresis.
    ///
    /// Leaving EVENT_LOCK arms the timer; while it runs, calm raw reads are
    /// degraded to UNDEFINED so the machine must confirm conservatism before
    /// re-entering a risk-on state. A re-lock cancels the cooldown outright.
    fn apply_cooldown(&mut self, raw: RawRegime) -> RawRegime {
        if raw.behavior == MarketBehavior::EventLock {
            self.cooldown_timer = 0;
            return raw;
        }

        if self.current_behavior == MarketBehavior::EventLock {
            if self.cooldown_timer == 0 {
                self.cooldown_timer = self.cooldown_bars;
            }
        } else if self.cooldown_timer > 0 {
            self.cooldown_timer -= 1;
        }

        if self.cooldown_timer > 0 && raw.behavior.is_calm() {
            return RawRegime {
                behavior: MarketBehavior::Undefined,
                bias: DirectionalBias::Neutral,
                diagnostic: "COOLDOWN",
            };
        }
        raw
    }

    fn required_confirmations(&self, candidate: MarketBehavior) -> u32 {
        match candidate {
            MarketBehavior::EventLock
            | MarketBehavior::TrendingHighVol
            | MarketBehavior::MeanRevertingHighVol
            | MarketBehavior::Undefined => self.hysteresis_risk_off,
            MarketBehavior::TrendingNormalVol => self.hysteresis_risk_on,
            MarketBehavior::MeanRevertingLowVol | MarketBehavior::EventDominant => {
                self.hysteresis_default
            }
        }
    }

    fn switch_to(&mut self, behavior: MarketBehavior, bias: DirectionalBias) {
        self.current_behavior = behavior;
        self.current_bias = bias;
        self.persistence_counter = 0;
        self.pending_behavior = None;
        self.pending_counter = 0;
    }

    fn confidence(&self, raw: &RawRegime, factors: &RegimeFactors) -> ConfidenceComponents {
        let persistence = (self.persistence_counter as f64 / PERSISTENCE_CAP).min(1.0);

        let mut intensity = factors.trend_strength_norm.clamp(0.0, 1.0);
        if factors.volatility_ratio > 1.0 {
            let vol_push = ((factors.volatility_ratio - 1.0) / 0.5).min(1.0);
            intensity = intensity.max(vol_push);
        }

        let confluence = if raw.behavior == self.current_behavior {
            1.0
        } else {
            0.5
        };

        ConfidenceComponents {
            confluence,
            persistence,
            intensity,
        }
    }
}
