//! Core regime types: behavior tags, bias overlay, factors, confidence,
//! and the confirmed state exposed to callers.
//!
//! Enum tags serialize as SCREAMING_SNAKE_CASE — that spelling is the
//! compatibility contract with downstream telemetry consumers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven mutually exclusive behavioral states of the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketBehavior {
    TrendingNormalVol,
    TrendingHighVol,
    MeanRevertingLowVol,
    MeanRevertingHighVol,
    EventDominant,
    EventLock,
    Undefined,
}

impl MarketBehavior {
    pub const ALL: [MarketBehavior; 7] = [
        MarketBehavior::TrendingNormalVol,
        MarketBehavior::TrendingHighVol,
        MarketBehavior::MeanRevertingLowVol,
        MarketBehavior::MeanRevertingHighVol,
        MarketBehavior::EventDominant,
        MarketBehavior::EventLock,
        MarketBehavior::Undefined,
    ];

    /// Calm quadrants that the post-lock cooldown refuses to re-enter.
    pub fn is_calm(self) -> bool {
        matches!(
            self,
            MarketBehavior::TrendingNormalVol | MarketBehavior::MeanRevertingLowVol
        )
    }

    /// States that unconditionally block all strategies (kill switches).
    pub fn is_kill_switch(self) -> bool {
        matches!(self, MarketBehavior::EventLock | MarketBehavior::Undefined)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarketBehavior::TrendingNormalVol => "TRENDING_NORMAL_VOL",
            MarketBehavior::TrendingHighVol => "TRENDING_HIGH_VOL",
            MarketBehavior::MeanRevertingLowVol => "MEAN_REVERTING_LOW_VOL",
            MarketBehavior::MeanRevertingHighVol => "MEAN_REVERTING_HIGH_VOL",
            MarketBehavior::EventDominant => "EVENT_DOMINANT",
            MarketBehavior::EventLock => "EVENT_LOCK",
            MarketBehavior::Undefined => "UNDEFINED",
        }
    }
}

impl fmt::Display for MarketBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directional overlay, orthogonal to behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectionalBias {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for DirectionalBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DirectionalBias::Bullish => "BULLISH",
            DirectionalBias::Bearish => "BEARISH",
            DirectionalBias::Neutral => "NEUTRAL",
        })
    }
}

/// Liquidity tag derived from the relative-volume score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiquidityStatus {
    Normal,
    Dry,
}

impl LiquidityStatus {
    /// DRY below the dry threshold, NORMAL at or above it.
    pub fn from_score(score: f64, dry_threshold: f64) -> Self {
        if score < dry_threshold {
            LiquidityStatus::Dry
        } else {
            LiquidityStatus::Normal
        }
    }
}

impl fmt::Display for LiquidityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LiquidityStatus::Normal => "NORMAL",
            LiquidityStatus::Dry => "DRY",
        })
    }
}

/// Normalized factor snapshot for one evaluation. Recomputed every time,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeFactors {
    pub trend_strength_norm: f64,
    pub volatility_ratio: f64,
    pub liquidity_status: LiquidityStatus,
    pub event_pressure_norm: f64,
}

/// Unconfirmed classification produced by the calculator for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRegime {
    pub behavior: MarketBehavior,
    pub bias: DirectionalBias,
    /// Short tag explaining which branch fired, for debugging.
    pub diagnostic: &'static str,
}

/// Decomposed confidence score, each component in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceComponents {
    /// Agreement between the latest raw classification and the confirmed one.
    pub confluence: f64,
    /// How long the confirmed state has held, normalized.
    pub persistence: f64,
    /// Magnitude of the underlying trend/volatility signal.
    pub intensity: f64,
}

impl ConfidenceComponents {
    /// Weighted total: 0.4 confluence + 0.4 persistence + 0.2 intensity.
    pub fn total(&self) -> f64 {
        self.confluence * 0.4 + self.persistence * 0.4 + self.intensity * 0.2
    }
}

/// The confirmed regime exposed to callers. Changes only when hysteresis
/// thresholds are met.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeState {
    pub behavior: MarketBehavior,
    pub bias: DirectionalBias,
    pub confidence_components: ConfidenceComponents,
    pub total_confidence: f64,
    pub is_stable: bool,
}
