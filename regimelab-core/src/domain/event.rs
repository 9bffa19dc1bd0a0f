//! Scheduled calendar events feeding the event-pressure provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled market-moving event (economic release, earnings, policy
/// announcement) known ahead of time.
///
/// `impact` weights the pressure contribution in `[0, 1]`; 1.0 is a
/// full-weight event such as a rate decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicEvent {
    pub time: DateTime<Utc>,
    pub impact: f64,
    pub label: String,
}

impl EconomicEvent {
    pub fn new(time: DateTime<Utc>, impact: f64, label: impl Into<String>) -> Self {
        Self {
            time,
            impact: impact.clamp(0.0, 1.0),
            label: label.into(),
        }
    }
}
