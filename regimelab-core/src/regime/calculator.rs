//! Stateless decision tree mapping factor outputs to a raw regime.
//!
//! Fixed priority order, each check short-circuiting the rest:
//! 1. event lock  2. liquidity dry  3. event dominance  4. quadrant table.

use crate::config::RegimeConfig;
use crate::regime::types::{DirectionalBias, LiquidityStatus, MarketBehavior, RawRegime};

#[derive(Debug, Clone)]
pub struct RegimeCalculator {
    trend_threshold: f64,
    high_vol_ratio: f64,
    liquidity_min: f64,
    liquidity_dry_score: f64,
    event_pressure_dominant: f64,
}

impl RegimeCalculator {
    pub fn from_config(config: &RegimeConfig) -> Self {
        Self {
            trend_threshold: config.trend_threshold,
            high_vol_ratio: config.high_vol_ratio,
            liquidity_min: config.liquidity_min,
            liquidity_dry_score: config.liquidity_dry_score,
            event_pressure_dominant: config.event_pressure_dominant,
        }
    }

    /// Liquidity tag for the given score, using the configured dry threshold.
    pub fn liquidity_status(&self, liquidity_score: f64) -> LiquidityStatus {
        LiquidityStatus::from_score(liquidity_score, self.liquidity_dry_score)
    }

    /// Deterministic classification of one factor snapshot.
    pub fn calculate(
        &self,
        trend_strength: f64,
        trend_bias: DirectionalBias,
        volatility_ratio: f64,
        liquidity_score: f64,
        event_pressure: f64,
        is_event_locked: bool,
    ) -> RawRegime {
        // 1. Event lock dominates everything; direction is meaningless inside it.
        if is_event_locked {
            return RawRegime {
                behavior: MarketBehavior::EventLock,
                bias: DirectionalBias::Neutral,
                diagnostic: "LOCKED",
            };
        }

        // 2. Liquidity: a DRY tape (or a score under the hard floor) cannot be
        //    classified — refuse rather than guess.
        if self.liquidity_status(liquidity_score) == LiquidityStatus::Dry
            || liquidity_score < self.liquidity_min
        {
            return RawRegime {
                behavior: MarketBehavior::Undefined,
                bias: DirectionalBias::Neutral,
                diagnostic: "LIQUIDITY_DRY",
            };
        }

        // 3. Event dominance: the calendar outweighs the technicals, but the
        //    directional read still passes through.
        if event_pressure >= self.event_pressure_dominant {
            return RawRegime {
                behavior: MarketBehavior::EventDominant,
                bias: trend_bias,
                diagnostic: "DOMINANT",
            };
        }

        // 4. Quadrant classification.
        let is_trending = trend_strength >= self.trend_threshold;
        let is_high_vol = volatility_ratio >= self.high_vol_ratio;

        let behavior = match (is_trending, is_high_vol) {
            (true, false) => MarketBehavior::TrendingNormalVol,
            (true, true) => MarketBehavior::TrendingHighVol,
            (false, false) => MarketBehavior::MeanRevertingLowVol,
            (false, true) => MarketBehavior::MeanRevertingHighVol,
        };

        RawRegime {
            behavior,
            bias: trend_bias,
            diagnostic: "NONE",
        }
    }
}
