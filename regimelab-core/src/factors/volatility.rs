//! Volatility ratio — current ATR against its own rolling baseline.
//!
//! Ratio = ATR(atr_period) / SMA(ATR, baseline_period). 1.0 means volatility
//! is at its recent baseline; above ~1.5 counts as expansion. Reports 1.0
//! (baseline) on thin or degenerate input.

use crate::config::RegimeConfig;
use crate::domain::Bar;
use crate::factors::math::{rolling_mean, true_range, wilder_smooth};

#[derive(Debug, Clone)]
pub struct VolatilityProvider {
    atr_period: usize,
    baseline_period: usize,
}

impl VolatilityProvider {
    pub fn new(atr_period: usize, baseline_period: usize) -> Self {
        assert!(atr_period >= 1, "ATR period must be >= 1");
        assert!(baseline_period >= 1, "baseline period must be >= 1");
        Self {
            atr_period,
            baseline_period,
        }
    }

    pub fn from_config(config: &RegimeConfig) -> Self {
        Self::new(config.atr_period, config.vol_baseline_period)
    }

    /// Current-ATR / baseline-ATR ratio, >= 0. Returns 1.0 when there is not
    /// enough history for both the ATR and its baseline, or when the
    /// baseline is zero (flat tape has no meaningful expansion signal).
    pub fn volatility_ratio(&self, bars: &[Bar]) -> f64 {
        if bars.len() < self.atr_period + self.baseline_period {
            return 1.0;
        }

        let mut tr = true_range(bars);
        if !tr.is_empty() {
            tr[0] = f64::NAN; // no previous close
        }
        let atr = wilder_smooth(&tr, self.atr_period);
        let baseline = rolling_mean(&atr, self.baseline_period);

        let current = atr.last().copied().unwrap_or(f64::NAN);
        let base = baseline.last().copied().unwrap_or(f64::NAN);

        if current.is_nan() || base.is_nan() {
            tracing::warn!(
                bars = bars.len(),
                "ATR ratio degenerate on sufficient history; assuming baseline"
            );
            return 1.0;
        }
        if base == 0.0 {
            return 1.0;
        }
        current / base
    }
}
