//! Event pressure — linear decay of impact from upcoming calendar events.
//!
//! Within `lock_window_min` minutes of an event the market is locked
//! (pressure 1.0). Between the lock window and `max_lookahead_min` the
//! pressure decays linearly to 0, scaled by the event's impact weight.
//! Events in the past or beyond the lookahead contribute nothing. With no
//! event list the provider reports (0.0, unlocked).

use chrono::{DateTime, Utc};

use crate::config::RegimeConfig;
use crate::domain::EconomicEvent;

/// Pressure snapshot: aggregate pressure plus whether any event is inside
/// its lock window right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventPressure {
    pub pressure: f64,
    pub is_lock_window: bool,
}

impl EventPressure {
    pub const NONE: Self = Self {
        pressure: 0.0,
        is_lock_window: false,
    };
}

#[derive(Debug, Clone)]
pub struct EventPressureProvider {
    lock_window_min: i64,
    max_lookahead_min: i64,
}

impl EventPressureProvider {
    pub fn new(lock_window_min: i64, max_lookahead_min: i64) -> Self {
        assert!(
            lock_window_min < max_lookahead_min,
            "lock window must be shorter than the lookahead"
        );
        Self {
            lock_window_min,
            max_lookahead_min,
        }
    }

    pub fn from_config(config: &RegimeConfig) -> Self {
        Self::new(config.event_lock_window_min, config.event_max_lookahead_min)
    }

    /// Aggregate pressure at `now`: the maximum contribution over all
    /// upcoming events.
    pub fn pressure(&self, now: DateTime<Utc>, events: &[EconomicEvent]) -> EventPressure {
        let mut max_pressure: f64 = 0.0;
        let mut is_locked = false;

        for event in events {
            let minutes_out = (event.time - now).num_seconds() as f64 / 60.0;

            if (0.0..=self.lock_window_min as f64).contains(&minutes_out) {
                is_locked = true;
                max_pressure = 1.0;
            } else if minutes_out > 0.0 && minutes_out <= self.max_lookahead_min as f64 {
                let dist = minutes_out - self.lock_window_min as f64;
                let span = (self.max_lookahead_min - self.lock_window_min) as f64;
                let decayed = (1.0 - dist / span) * event.impact;
                max_pressure = max_pressure.max(decayed.clamp(0.0, 1.0));
            }
        }

        EventPressure {
            pressure: max_pressure,
            is_lock_window: is_locked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::{assert_approx, DEFAULT_EPSILON};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 13, 0, 0).unwrap()
    }

    fn event_in(minutes: i64, impact: f64) -> EconomicEvent {
        EconomicEvent::new(now() + Duration::minutes(minutes), impact, "CPI")
    }

    fn provider() -> EventPressureProvider {
        EventPressureProvider::new(15, 60)
    }

    #[test]
    fn no_events_no_pressure() {
        assert_eq!(provider().pressure(now(), &[]), EventPressure::NONE);
    }

    #[test]
    fn inside_lock_window_locks() {
        let p = provider().pressure(now(), &[event_in(10, 1.0)]);
        assert!(p.is_lock_window);
        assert_eq!(p.pressure, 1.0);
    }

    #[test]
    fn lock_window_boundary_is_inclusive() {
        let p = provider().pressure(now(), &[event_in(15, 1.0)]);
        assert!(p.is_lock_window);
    }

    #[test]
    fn linear_decay_between_lock_and_lookahead() {
        // 30 min out with a 15..60 ramp: (1 - 15/45) = 2/3.
        let p = provider().pressure(now(), &[event_in(30, 1.0)]);
        assert!(!p.is_lock_window);
        assert_approx(p.pressure, 2.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn impact_scales_pressure() {
        let p = provider().pressure(now(), &[event_in(30, 0.5)]);
        assert_approx(p.pressure, 1.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn beyond_lookahead_is_ignored() {
        let p = provider().pressure(now(), &[event_in(90, 1.0)]);
        assert_eq!(p, EventPressure::NONE);
    }

    #[test]
    fn past_events_are_ignored() {
        let p = provider().pressure(now(), &[event_in(-5, 1.0)]);
        assert_eq!(p, EventPressure::NONE);
    }

    #[test]
    fn max_contribution_wins() {
        let p = provider().pressure(now(), &[event_in(55, 1.0), event_in(20, 1.0)]);
        assert!(!p.is_lock_window);
        // 20 min out: (1 - 5/45) = 8/9 dominates the distant event.
        assert_approx(p.pressure, 8.0 / 9.0, DEFAULT_EPSILON);
    }
}
