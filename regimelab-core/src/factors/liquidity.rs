//! Liquidity score — relative volume against its rolling mean.
//!
//! Score = min(1, currentVolume / SMA(volume, window)), clamped to `[0, 1]`.
//! 1.0 means at-or-above average participation; values sliding toward 0
//! mean the tape is drying up. Reports 1.0 (assume fine) on thin history —
//! missing data is handled by the guard's fail-safe, not here.

use crate::config::RegimeConfig;
use crate::domain::Bar;
use crate::factors::math::rolling_mean;

#[derive(Debug, Clone)]
pub struct LiquidityProvider {
    window: usize,
}

impl LiquidityProvider {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "liquidity window must be >= 1");
        Self { window }
    }

    pub fn from_config(config: &RegimeConfig) -> Self {
        Self::new(config.liquidity_window)
    }

    /// Normalized liquidity score in `[0, 1]`. A zero rolling average means
    /// there is no volume history to trust — that scores 0.0 (illiquid).
    pub fn liquidity_score(&self, bars: &[Bar]) -> f64 {
        if bars.len() < self.window {
            return 1.0;
        }

        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
        let avg = rolling_mean(&volumes, self.window)
            .last()
            .copied()
            .unwrap_or(f64::NAN);
        let current = *volumes.last().expect("non-empty by length check");

        if avg.is_nan() {
            tracing::warn!("volume mean degenerate on sufficient history; assuming normal");
            return 1.0;
        }
        if avg == 0.0 {
            return 0.0;
        }
        (current / avg).clamp(0.0, 1.0)
    }
}
