//! Trend strength (Wilder ADX) and directional alignment (EMA stack).
//!
//! Strength: +DM/-DM smoothed against TR, DX, then Wilder-smoothed DX,
//! normalized by /100 into `[0, 1]`. Needs 2x the ADX period of bars;
//! below that the provider reports 0.0 (no measurable trend).
//!
//! Alignment: a non-neutral call requires the full strict stack
//! `price > ema_fast > ema_slow > ema_trend` (or fully inverted).

use crate::config::RegimeConfig;
use crate::domain::Bar;
use crate::factors::math::{ema_series, true_range, wilder_smooth};
use crate::regime::types::DirectionalBias;

#[derive(Debug, Clone)]
pub struct TrendProvider {
    adx_period: usize,
    ema_fast: usize,
    ema_slow: usize,
    ema_trend: usize,
}

impl TrendProvider {
    pub fn new(adx_period: usize, ema_fast: usize, ema_slow: usize, ema_trend: usize) -> Self {
        assert!(adx_period >= 1, "ADX period must be >= 1");
        assert!(
            ema_fast < ema_slow && ema_slow < ema_trend,
            "EMA periods must be strictly increasing"
        );
        Self {
            adx_period,
            ema_fast,
            ema_slow,
            ema_trend,
        }
    }

    pub fn from_config(config: &RegimeConfig) -> Self {
        Self::new(
            config.trend_period,
            config.ema_fast,
            config.ema_slow,
            config.ema_trend,
        )
    }

    /// Normalized trend strength in `[0, 1]`. Returns 0.0 on thin or
    /// degenerate input.
    pub fn trend_strength(&self, bars: &[Bar]) -> f64 {
        if bars.len() < 2 * self.adx_period {
            return 0.0;
        }

        let adx = match self.latest_adx(bars) {
            Some(v) => v,
            None => {
                tracing::warn!(
                    bars = bars.len(),
                    "ADX yielded no value on sufficient history; treating as no trend"
                );
                return 0.0;
            }
        };
        (adx / 100.0).clamp(0.0, 1.0)
    }

    /// Directional bias from the EMA stack. NEUTRAL below `ema_trend` bars
    /// or when the stack is not strictly ordered.
    pub fn alignment(&self, bars: &[Bar]) -> DirectionalBias {
        if bars.len() < self.ema_trend {
            return DirectionalBias::Neutral;
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = last_value(&ema_series(&closes, self.ema_fast));
        let slow = last_value(&ema_series(&closes, self.ema_slow));
        let trend = last_value(&ema_series(&closes, self.ema_trend));
        let price = *closes.last().expect("non-empty by length check");

        let (fast, slow, trend) = match (fast, slow, trend) {
            (Some(f), Some(s), Some(t)) if !price.is_nan() => (f, s, t),
            _ => {
                tracing::warn!("EMA stack degenerate on sufficient history; alignment NEUTRAL");
                return DirectionalBias::Neutral;
            }
        };

        if price > fast && fast > slow && slow > trend {
            DirectionalBias::Bullish
        } else if price < fast && fast < slow && slow < trend {
            DirectionalBias::Bearish
        } else {
            DirectionalBias::Neutral
        }
    }

    fn latest_adx(&self, bars: &[Bar]) -> Option<f64> {
        let n = bars.len();

        // Directional movement from consecutive bars.
        let mut plus_dm = vec![f64::NAN; n];
        let mut minus_dm = vec![f64::NAN; n];
        for i in 1..n {
            let up = bars[i].high - bars[i - 1].high;
            let down = bars[i - 1].low - bars[i].low;
            if up.is_nan() || down.is_nan() {
                continue;
            }
            plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
            minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
        }

        // TR[0] has no previous close; drop it so the seed starts at TR[1].
        let mut tr = true_range(bars);
        if !tr.is_empty() {
            tr[0] = f64::NAN;
        }

        let smooth_tr = wilder_smooth(&tr, self.adx_period);
        let smooth_plus = wilder_smooth(&plus_dm, self.adx_period);
        let smooth_minus = wilder_smooth(&minus_dm, self.adx_period);

        let mut dx = vec![f64::NAN; n];
        for i in 0..n {
            let (t, p, m) = (smooth_tr[i], smooth_plus[i], smooth_minus[i]);
            if t.is_nan() || p.is_nan() || m.is_nan() || t == 0.0 {
                continue;
            }
            let plus_di = 100.0 * p / t;
            let minus_di = 100.0 * m / t;
            let di_sum = plus_di + minus_di;
            dx[i] = if di_sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / di_sum
            };
        }

        last_value(&wilder_smooth(&dx, self.adx_period))
    }
}

fn last_value(series: &[f64]) -> Option<f64> {
    series.last().copied().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::{make_bars, make_ohlc_bars};

    fn provider() -> TrendProvider {
        TrendProvider::new(3, 3, 5, 8)
    }

    #[test]
    fn strength_zero_on_thin_history() {
        let bars = make_ohlc_bars(&[(100.0, 105.0, 95.0, 102.0); 5]);
        assert_eq!(provider().trend_strength(&bars), 0.0);
    }

    #[test]
    fn strength_bounded() {
        let mut data = Vec::new();
        for i in 0..30 {
            let base = 100.0 + i as f64 * 5.0;
            data.push((base - 1.0, base + 3.0, base - 3.0, base + 2.0));
        }
        let bars = make_ohlc_bars(&data);
        let s = provider().trend_strength(&bars);
        assert!((0.0..=1.0).contains(&s), "strength out of bounds: {s}");
    }

    #[test]
    fn strong_trend_has_elevated_strength() {
        let mut data = Vec::new();
        for i in 0..40 {
            let base = 100.0 + i as f64 * 5.0;
            data.push((base - 1.0, base + 3.0, base - 3.0, base + 2.0));
        }
        let bars = make_ohlc_bars(&data);
        let s = provider().trend_strength(&bars);
        assert!(s > 0.25, "expected elevated strength in strong trend, got {s}");
    }

    #[test]
    fn alignment_neutral_on_thin_history() {
        let bars = make_bars(&[100.0; 5]);
        assert_eq!(provider().alignment(&bars), DirectionalBias::Neutral);
    }

    #[test]
    fn alignment_bullish_in_rising_market() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64 * 2.0).collect();
        let bars = make_bars(&closes);
        assert_eq!(provider().alignment(&bars), DirectionalBias::Bullish);
    }

    #[test]
    fn alignment_bearish_in_falling_market() {
        let closes: Vec<f64> = (0..40).map(|i| 200.0 - i as f64 * 2.0).collect();
        let bars = make_bars(&closes);
        assert_eq!(provider().alignment(&bars), DirectionalBias::Bearish);
    }

    #[test]
    fn alignment_neutral_on_flat_market() {
        let bars = make_bars(&[100.0; 40]);
        assert_eq!(provider().alignment(&bars), DirectionalBias::Neutral);
    }

    #[test]
    fn strength_zero_on_degenerate_bars() {
        let mut bars = make_bars(&[100.0; 20]);
        for bar in bars.iter_mut().skip(10) {
            bar.high = f64::NAN;
        }
        assert_eq!(provider().trend_strength(&bars), 0.0);
    }
}
