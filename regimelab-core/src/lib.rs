//! RegimeLab Core — market regime detection and strategy gating.
//!
//! This crate contains the classification engine:
//! - Domain types (bars, economic events)
//! - Factor providers (trend, volatility, liquidity, event pressure)
//! - Stateless decision-tree calculator producing a raw regime per snapshot
//! - Hysteresis state machine confirming regime transitions over time
//! - Strategy gate mapping confirmed regimes to allow/reduce/block verdicts
//!
//! The runner crate layers the integration guard, runtime modes, and
//! telemetry on top of these pieces.

pub mod config;
pub mod domain;
pub mod factors;
pub mod regime;
