// SPDX-License-Identifier: MIT

//! Geofence alert engine.
//!
//! Composes zone evaluation, the per-user cooldown throttle, and the
//! outbound notifier. Position samples arrive from both the chat channel
//! (shared locations) and the standalone beacon endpoint.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{AlertState, Coordinate};
use crate::services::chat::Notifier;
use crate::services::geofence::ZoneEvaluator;
use crate::services::throttle::AlertThrottle;

/// Warning pushed when a tracked user enters a danger zone.
const DANGER_WARNING: &str = "\u{26a0} You are inside a danger zone. Please stay alert!";

/// One-time notice sent when idle tracking state is evicted.
const IDLE_DISABLED_NOTICE: &str =
    "Location tracking was disabled after a period of inactivity. Send \"track me\" to re-enable.";

/// Per-user geofence alerting with opt-in tracking and cooldown.
pub struct AlertEngine {
    tracking: DashMap<String, AlertState>,
    throttle: AlertThrottle,
    zones: ZoneEvaluator,
    notifier: Arc<dyn Notifier>,
    idle_timeout: Duration,
}

impl AlertEngine {
    pub fn new(
        zones: ZoneEvaluator,
        notifier: Arc<dyn Notifier>,
        cooldown: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            tracking: DashMap::new(),
            throttle: AlertThrottle::new(cooldown),
            zones,
            notifier,
            idle_timeout,
        }
    }

    /// Opt a user into tracking. Returns false if already enabled.
    pub fn enable_tracking(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        if self.tracking.contains_key(user_id) {
            return false;
        }
        self.tracking
            .insert(user_id.to_string(), AlertState::new(now));
        tracing::info!(user_id, "Tracking enabled");
        true
    }

    /// Opt a user out of tracking. Returns false if not tracking.
    pub fn disable_tracking(&self, user_id: &str) -> bool {
        let removed = self.tracking.remove(user_id).is_some();
        if removed {
            self.throttle.forget(user_id);
            tracing::info!(user_id, "Tracking disabled");
        }
        removed
    }

    pub fn is_tracking(&self, user_id: &str) -> bool {
        self.tracking.contains_key(user_id)
    }

    /// Handle one position sample.
    ///
    /// Fires a warning only when the user opted in, the position is inside
    /// a danger zone, and the cooldown permits. The fired-time is recorded
    /// only after a confirmed send, so a failed delivery may retry on the
    /// next sample. Returns true when a warning was sent.
    pub async fn on_position_sample(
        &self,
        user_id: &str,
        coordinate: Coordinate,
        now: DateTime<Utc>,
        reply_token: Option<&str>,
    ) -> bool {
        // Update idle state inside the entry lock, then release it before
        // any await point.
        match self.tracking.get_mut(user_id) {
            Some(mut state) => state.last_position_at = now,
            None => return false,
        }

        if !self.zones.is_in_danger_zone(coordinate).await {
            return false;
        }

        if !self.throttle.should_fire(user_id, now) {
            tracing::debug!(user_id, "In danger zone but throttled");
            return false;
        }

        let sent = match reply_token {
            Some(token) => self.notifier.send_immediate(token, DANGER_WARNING).await,
            None => self.notifier.send_deferred(user_id, DANGER_WARNING).await,
        };

        match sent {
            Ok(()) => {
                self.throttle.record_fired(user_id, now);
                tracing::info!(
                    user_id,
                    lat = coordinate.lat,
                    lng = coordinate.lng,
                    "Danger zone warning sent"
                );
                true
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Warning send failed, cooldown not consumed");
                false
            }
        }
    }

    /// Evict tracking state idle beyond the timeout, with a one-time
    /// notice. Keys are snapshotted before mutation.
    pub async fn sweep_idle(&self, now: DateTime<Utc>) -> Vec<String> {
        let cutoff = chrono::Duration::from_std(self.idle_timeout).unwrap_or_default();

        let stale: Vec<String> = self
            .tracking
            .iter()
            .filter(|entry| now.signed_duration_since(entry.value().last_position_at) >= cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = Vec::new();
        for user_id in stale {
            if self.tracking.remove(&user_id).is_none() {
                continue; // opted out while we were sweeping
            }
            self.throttle.forget(&user_id);

            if let Err(e) = self
                .notifier
                .send_deferred(&user_id, IDLE_DISABLED_NOTICE)
                .await
            {
                tracing::warn!(user_id = %user_id, error = %e, "Idle eviction notice failed");
            }
            tracing::info!(user_id = %user_id, "Idle tracking state evicted");
            evicted.push(user_id);
        }
        evicted
    }
}
