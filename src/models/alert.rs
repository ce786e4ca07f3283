// SPDX-License-Identifier: MIT

//! Per-user tracking state for the alert engine.
//!
//! A user is "tracking" while an entry for them exists in the engine's map;
//! opting out or idle eviction removes the entry.

use chrono::{DateTime, Utc};

/// State kept for each user who opted into location tracking.
#[derive(Debug, Clone)]
pub struct AlertState {
    /// When the user enabled tracking.
    pub opted_in_at: DateTime<Utc>,
    /// Last position sample, used for idle-timeout eviction.
    pub last_position_at: DateTime<Utc>,
}

impl AlertState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            opted_in_at: now,
            last_position_at: now,
        }
    }
}
