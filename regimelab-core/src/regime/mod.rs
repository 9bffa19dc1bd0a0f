//! Regime classification: decision tree, hysteresis state machine, and the
//! strategy gate layered on top of the confirmed state.

pub mod calculator;
pub mod gate;
pub mod pipeline;
pub mod state;
pub mod types;

pub use calculator::RegimeCalculator;
pub use gate::{compatibility, GateAction, GateDecision, StrategyClass, StrategyGate};
pub use pipeline::RegimePipeline;
pub use state::StateManager;
pub use types::{
    ConfidenceComponents, DirectionalBias, LiquidityStatus, MarketBehavior, RawRegime,
    RegimeFactors, RegimeState,
};
