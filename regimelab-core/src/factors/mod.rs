//! Factor providers — pure functions over a trailing window of bars.
//!
//! Each provider reads the window ending at "now" and returns a normalized
//! scalar or tag. Providers never look ahead, never mutate input, and never
//! error on thin data — they return a documented conservative default
//! instead:
//!
//! | Provider         | Output            | Fallback          |
//! |------------------|-------------------|-------------------|
//! | trend strength   | `[0, 1]`          | 0.0               |
//! | trend alignment  | bias tag          | NEUTRAL           |
//! | volatility ratio | `>= 0` (1 = base) | 1.0               |
//! | liquidity score  | `[0, 1]`          | 1.0 (assume fine) |
//! | event pressure   | `[0, 1]` + lock   | (0.0, false)      |

pub mod event;
pub mod liquidity;
pub mod math;
pub mod trend;
pub mod volatility;

pub use event::{EventPressure, EventPressureProvider};
pub use liquidity::LiquidityProvider;
pub use trend::TrendProvider;
pub use volatility::VolatilityProvider;

/// Create synthetic bars from (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 9, 15, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| crate::domain::Bar {
            symbol: "TEST".to_string(),
            timestamp: base + Duration::minutes(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Create synthetic bars from close prices with plausible OHLV.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_ohlc_bars(&data)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for factor tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
