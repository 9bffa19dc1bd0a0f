//! RegimeLab Runner — integration layer over the core engine.
//!
//! Hosts the pieces a trading system touches directly:
//! - [`RegimeGuard`]: the one call to make before acting on a signal
//! - [`RuntimeMode`]: OFF / SHADOW / ENFORCED authority levels
//! - Telemetry records, sinks, and the console formatter
//! - Offline analytics over recorded telemetry logs

pub mod analytics;
pub mod guard;
pub mod mode;
pub mod telemetry;

pub use analytics::{summarize, summarize_file, TelemetrySummary};
pub use guard::RegimeGuard;
pub use mode::RuntimeMode;
pub use telemetry::{JsonlSink, MemorySink, NoopSink, TelemetryRecord, TelemetrySink};
