//! Engine configuration — every classification threshold in one place.
//!
//! All thresholds are independently overridable; a partial TOML file overrides
//! only the fields it names. `fingerprint()` gives a deterministic
//! content-addressable hash so a telemetry stream can be tied to the exact
//! thresholds that produced it.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Thresholds and windows for the regime engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    // Factor provider windows
    /// ADX period for trend strength (needs 2x this many bars).
    pub trend_period: usize,
    /// Fast EMA period for trend alignment.
    pub ema_fast: usize,
    /// Slow EMA period for trend alignment.
    pub ema_slow: usize,
    /// Very-slow EMA period; alignment returns NEUTRAL below this many bars.
    pub ema_trend: usize,
    /// ATR period for the volatility ratio numerator.
    pub atr_period: usize,
    /// Rolling-mean period for the ATR baseline denominator.
    pub vol_baseline_period: usize,
    /// Rolling-mean period for the relative-volume liquidity score.
    pub liquidity_window: usize,
    /// Minutes before an event during which the market is locked.
    pub event_lock_window_min: i64,
    /// Minutes of lookahead over which event pressure decays to zero.
    pub event_max_lookahead_min: i64,

    // Calculator thresholds
    /// Normalized ADX at or above which the market counts as trending.
    pub trend_threshold: f64,
    /// Volatility ratio at or above which the market counts as high-vol.
    pub high_vol_ratio: f64,
    /// Hard floor on the liquidity score below which classification is refused.
    pub liquidity_min: f64,
    /// Liquidity score below which the tape is tagged DRY.
    pub liquidity_dry_score: f64,
    /// Event pressure at or above which the event dominates classification.
    pub event_pressure_dominant: f64,

    // State machine
    /// Confirmations required to enter TRENDING_NORMAL_VOL (risk-on, slow).
    pub hysteresis_risk_on: u32,
    /// Confirmations required to enter risk-off states (fast).
    pub hysteresis_risk_off: u32,
    /// Confirmations required for everything else.
    pub hysteresis_default: u32,
    /// Updates of forced conservatism after leaving EVENT_LOCK.
    pub cooldown_bars: u32,

    // Integration guard
    /// Below this many bars the guard fail-safes to a denial.
    pub min_history_bars: usize,
    /// Trailing bars replayed to reconstruct hysteresis state per check.
    pub warmup_replay_bars: usize,
    /// Bound on the per-symbol state-manager cache (FIFO eviction).
    pub max_cached_symbols: usize,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            trend_period: 14,
            ema_fast: 20,
            ema_slow: 50,
            ema_trend: 200,
            atr_period: 14,
            vol_baseline_period: 20,
            liquidity_window: 20,
            event_lock_window_min: 15,
            event_max_lookahead_min: 60,
            trend_threshold: 0.25,
            high_vol_ratio: 1.5,
            liquidity_min: 0.2,
            liquidity_dry_score: 0.5,
            event_pressure_dominant: 0.8,
            hysteresis_risk_on: 5,
            hysteresis_risk_off: 1,
            hysteresis_default: 3,
            cooldown_bars: 30,
            min_history_bars: 50,
            warmup_replay_bars: 15,
            max_cached_symbols: 256,
        }
    }
}

impl RegimeConfig {
    /// Parse a (possibly partial) TOML string; unnamed fields keep defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Startup-time sanity check of threshold relationships.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trend_period == 0 || self.atr_period == 0 {
            return Err(ConfigError::Invalid("periods must be >= 1".into()));
        }
        if !(self.ema_fast < self.ema_slow && self.ema_slow < self.ema_trend) {
            return Err(ConfigError::Invalid(
                "EMA periods must be strictly increasing (fast < slow < trend)".into(),
            ));
        }
        if self.event_lock_window_min >= self.event_max_lookahead_min {
            return Err(ConfigError::Invalid(
                "event_lock_window_min must be below event_max_lookahead_min".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.trend_threshold)
            || !(0.0..=1.0).contains(&self.event_pressure_dominant)
            || !(0.0..=1.0).contains(&self.liquidity_min)
            || !(0.0..=1.0).contains(&self.liquidity_dry_score)
        {
            return Err(ConfigError::Invalid(
                "normalized thresholds must be within [0, 1]".into(),
            ));
        }
        if self.hysteresis_risk_on == 0 || self.hysteresis_risk_off == 0 || self.hysteresis_default == 0
        {
            return Err(ConfigError::Invalid(
                "hysteresis confirmation counts must be >= 1".into(),
            ));
        }
        if self.max_cached_symbols == 0 {
            return Err(ConfigError::Invalid("max_cached_symbols must be >= 1".into()));
        }
        if self.min_history_bars == 0 {
            return Err(ConfigError::Invalid("min_history_bars must be >= 1".into()));
        }
        Ok(())
    }

    /// Deterministic content hash of this configuration.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("RegimeConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
