//! Reactivation Window Evaluator
//!
//! Right after a payment, physical reconnection can still be pending. Inside the
//! window the customer gets a one-sentence note with the payment time and the
//! minutes left; outside it nothing is said.

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use serde::Serialize;
use utility_agent_config::AgentConfig;
use utility_agent_core::{Language, Service};

use crate::templates;

/// Grace period after a payment
#[derive(Debug, Clone, Copy)]
pub struct ReactivationWindow {
    duration: Duration,
    display_offset: FixedOffset,
}

impl ReactivationWindow {
    pub fn new(duration: Duration, display_offset: FixedOffset) -> Self {
        Self {
            duration,
            display_offset,
        }
    }

    pub fn from_config(agent: &AgentConfig) -> Self {
        let duration = i64::try_from(agent.reactivation_window_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        let offset = FixedOffset::east_opt(agent.display_utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());
        Self::new(duration, offset)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// `None` when there is no payment or the window has closed.
    /// Negative elapsed time (store clock behind ours) counts as zero.
    pub fn evaluate(
        &self,
        service: Service,
        last_payment_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<Advisory> {
        let paid_at = last_payment_at?;
        let elapsed = (now - paid_at).max(Duration::zero());
        if elapsed >= self.duration {
            return None;
        }

        let remaining_ms = (self.duration - elapsed).num_milliseconds();
        let remaining_minutes = (remaining_ms.saturating_add(59_999) / 60_000).max(1);

        Some(Advisory {
            service,
            paid_at: paid_at.with_timezone(&self.display_offset),
            remaining_minutes,
        })
    }
}

/// Pending-reconnection note for one service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory {
    pub service: Service,
    /// Payment time in the utility's display timezone
    pub paid_at: DateTime<FixedOffset>,
    /// Whole minutes left, never below one
    pub remaining_minutes: i64,
}

impl Advisory {
    pub fn render(&self, language: Language) -> String {
        templates::advisory(self, language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window(secs: i64) -> ReactivationWindow {
        ReactivationWindow::new(Duration::seconds(secs), FixedOffset::east_opt(3600).unwrap())
    }

    fn paid_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 4, 9, 0, 0).unwrap()
    }

    fn remaining(elapsed_secs: i64) -> Option<i64> {
        window(120)
            .evaluate(
                Service::Water,
                Some(paid_at()),
                paid_at() + Duration::seconds(elapsed_secs),
            )
            .map(|a| a.remaining_minutes)
    }

    #[test]
    fn test_remaining_minutes() {
        assert_eq!(remaining(0), Some(2));
        assert_eq!(remaining(30), Some(2));
        assert_eq!(remaining(61), Some(1));
        assert_eq!(remaining(119), Some(1));
        assert_eq!(remaining(120), None);
        assert_eq!(remaining(4000), None);
    }

    #[test]
    fn test_clock_skew_counts_as_zero() {
        assert_eq!(remaining(-5), Some(2));
    }

    #[test]
    fn test_no_payment_no_advisory() {
        assert!(window(120).evaluate(Service::Water, None, paid_at()).is_none());
    }

    #[test]
    fn test_paid_at_in_display_timezone() {
        let advisory = window(7200)
            .evaluate(Service::Electricity, Some(paid_at()), paid_at())
            .unwrap();
        assert_eq!(advisory.paid_at.format("%H:%M").to_string(), "10:00");
        assert_eq!(advisory.remaining_minutes, 120);
    }

    #[test]
    fn test_from_config() {
        let agent = AgentConfig {
            reactivation_window_secs: 120,
            display_utc_offset_minutes: 60,
            ..Default::default()
        };
        let w = ReactivationWindow::from_config(&agent);
        assert_eq!(w.duration(), Duration::seconds(120));
    }

    #[test]
    fn test_oversized_window_saturates() {
        let agent = AgentConfig {
            reactivation_window_secs: 100_000_000_000_000_000,
            ..Default::default()
        };
        let w = ReactivationWindow::from_config(&agent);
        assert_eq!(w.duration(), Duration::MAX);
        let advisory = w
            .evaluate(Service::Water, Some(paid_at()), paid_at() + Duration::seconds(30))
            .unwrap();
        assert!(advisory.remaining_minutes > 0);
    }
}
