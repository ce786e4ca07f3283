// SPDX-License-Identifier: MIT

//! Per-user alert cooldown tracking.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

/// Decides whether a new alert may fire for a user.
///
/// `should_fire` and `record_fired` are deliberately separate calls: the
/// fired-time is only recorded after a confirmed successful send, so a
/// failed delivery leaves the cooldown open for the next sample.
pub struct AlertThrottle {
    cooldown: Duration,
    last_alert_at: DashMap<String, DateTime<Utc>>,
}

impl AlertThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_alert_at: DashMap::new(),
        }
    }

    /// True iff no prior alert is recorded for the user, or the cooldown
    /// has elapsed since the last one.
    pub fn should_fire(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        match self.last_alert_at.get(user_id) {
            Some(last) => {
                let elapsed = now.signed_duration_since(*last);
                elapsed >= chrono::Duration::from_std(self.cooldown).unwrap_or_default()
            }
            None => true,
        }
    }

    /// Record a confirmed alert send.
    pub fn record_fired(&self, user_id: &str, now: DateTime<Utc>) {
        self.last_alert_at.insert(user_id.to_string(), now);
    }

    /// Drop throttle state for a user (opt-out, eviction).
    pub fn forget(&self, user_id: &str) {
        self.last_alert_at.remove(user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle(secs: u64) -> AlertThrottle {
        AlertThrottle::new(Duration::from_secs(secs))
    }

    #[test]
    fn first_alert_always_fires() {
        let t = throttle(15);
        assert!(t.should_fire("U1", Utc::now()));
    }

    #[test]
    fn within_cooldown_is_suppressed() {
        let t = throttle(15);
        let start = Utc::now();

        t.record_fired("U1", start);
        assert!(!t.should_fire("U1", start + chrono::Duration::seconds(10)));
        assert!(t.should_fire("U1", start + chrono::Duration::seconds(15)));
        assert!(t.should_fire("U1", start + chrono::Duration::seconds(20)));
    }

    #[test]
    fn unrecorded_send_does_not_consume_cooldown() {
        let t = throttle(15);
        let start = Utc::now();

        // should_fire alone must not start a cooldown.
        assert!(t.should_fire("U1", start));
        assert!(t.should_fire("U1", start + chrono::Duration::seconds(1)));
    }

    #[test]
    fn users_are_throttled_independently() {
        let t = throttle(15);
        let start = Utc::now();

        t.record_fired("U1", start);
        assert!(!t.should_fire("U1", start + chrono::Duration::seconds(5)));
        assert!(t.should_fire("U2", start + chrono::Duration::seconds(5)));
    }

    #[test]
    fn forget_resets_the_cooldown() {
        let t = throttle(60);
        let start = Utc::now();

        t.record_fired("U1", start);
        assert!(!t.should_fire("U1", start + chrono::Duration::seconds(1)));

        t.forget("U1");
        assert!(t.should_fire("U1", start + chrono::Duration::seconds(1)));
    }
}
