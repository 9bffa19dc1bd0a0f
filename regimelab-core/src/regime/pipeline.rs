//! One-stop evaluation: bars + calendar in, raw classification out.
//!
//! The pipeline owns the four factor providers and the calculator so that
//! callers never sequence them by hand. It is stateless; hysteresis lives in
//! [`StateManager`](crate::regime::StateManager).

use crate::config::RegimeConfig;
use crate::domain::{Bar, EconomicEvent};
use crate::factors::{
    EventPressure, EventPressureProvider, LiquidityProvider, TrendProvider, VolatilityProvider,
};
use crate::regime::calculator::RegimeCalculator;
use crate::regime::types::{RawRegime, RegimeFactors};

#[derive(Debug, Clone)]
pub struct RegimePipeline {
    trend: TrendProvider,
    volatility: VolatilityProvider,
    liquidity: LiquidityProvider,
    events: EventPressureProvider,
    calculator: RegimeCalculator,
}

impl RegimePipeline {
    pub fn from_config(config: &RegimeConfig) -> Self {
        Self {
            trend: TrendProvider::from_config(config),
            volatility: VolatilityProvider::from_config(config),
            liquidity: LiquidityProvider::from_config(config),
            events: EventPressureProvider::from_config(config),
            calculator: RegimeCalculator::from_config(config),
        }
    }

    /// Evaluate one snapshot. Event pressure is measured at the close of the
    /// latest bar, so replays of historical windows see the pressure that was
    /// in force then, not at wall-clock now.
    pub fn observe(&self, bars: &[Bar], events: &[EconomicEvent]) -> (RawRegime, RegimeFactors) {
        let trend_strength = self.trend.trend_strength(bars);
        let trend_bias = self.trend.alignment(bars);
        let volatility_ratio = self.volatility.volatility_ratio(bars);
        let liquidity_score = self.liquidity.liquidity_score(bars);

        let pressure = match bars.last() {
            Some(bar) => self.events.pressure(bar.timestamp, events),
            None => EventPressure::NONE,
        };

        let raw = self.calculator.calculate(
            trend_strength,
            trend_bias,
            volatility_ratio,
            liquidity_score,
            pressure.pressure,
            pressure.is_lock_window,
        );

        let factors = RegimeFactors {
            trend_strength_norm: trend_strength,
            volatility_ratio,
            liquidity_status: self.calculator.liquidity_status(liquidity_score),
            event_pressure_norm: pressure.pressure,
        };

        (raw, factors)
    }
}
