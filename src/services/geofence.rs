// SPDX-License-Identifier: MIT

//! Danger-zone membership evaluation.
//!
//! Two zone sources are checked: the static configured zone, and dynamic
//! zones derived from previously finalized reports. A failing dynamic
//! lookup degrades to the static zone alone rather than going silent.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::coordinate::{distance_meters, BoundingBox, Coordinate};

/// Fixed circular danger zone.
#[derive(Debug, Clone, Copy)]
pub struct StaticZone {
    pub center: Coordinate,
    pub radius_meters: f64,
}

impl StaticZone {
    /// Membership test; the boundary is inclusive.
    pub fn contains(&self, point: Coordinate) -> bool {
        distance_meters(point, self.center) <= self.radius_meters
    }
}

/// Source of historical report positions for dynamic zone membership.
#[async_trait]
pub trait ZoneHistoryLookup: Send + Sync {
    /// Candidate positions inside the bounding box. Errors signal that the
    /// caller should fall back to static-only evaluation.
    async fn candidates_near(&self, bbox: BoundingBox) -> Result<Vec<Coordinate>>;
}

/// In-memory history of finalized report positions.
///
/// Fed by the report finalizer; optionally windowed so only recent reports
/// count as danger zones.
#[derive(Default)]
pub struct ReportHistory {
    entries: RwLock<Vec<(Coordinate, DateTime<Utc>)>>,
    window_hours: Option<u32>,
}

impl ReportHistory {
    pub fn new(window_hours: Option<u32>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            window_hours,
        }
    }

    /// Record a finalized report position.
    pub fn record(&self, coordinate: Coordinate, at: DateTime<Utc>) {
        let mut entries = self.entries.write().expect("history lock poisoned");
        entries.push((coordinate, at));
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("history lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ZoneHistoryLookup for ReportHistory {
    async fn candidates_near(&self, bbox: BoundingBox) -> Result<Vec<Coordinate>> {
        let cutoff = self
            .window_hours
            .map(|h| Utc::now() - Duration::hours(h as i64));

        let entries = self
            .entries
            .read()
            .map_err(|_| AppError::Upstream("report history lock poisoned".to_string()))?;

        Ok(entries
            .iter()
            .filter(|(_, at)| cutoff.is_none_or(|c| *at >= c))
            .filter(|(coord, _)| bbox.contains(*coord))
            .map(|(coord, _)| *coord)
            .collect())
    }
}

/// Evaluates whether a position is inside any danger zone.
pub struct ZoneEvaluator {
    static_zone: StaticZone,
    radius_meters: f64,
    history: Arc<dyn ZoneHistoryLookup>,
}

impl ZoneEvaluator {
    pub fn new(static_zone: StaticZone, history: Arc<dyn ZoneHistoryLookup>) -> Self {
        Self {
            static_zone,
            radius_meters: static_zone.radius_meters,
            history,
        }
    }

    /// True when `point` is inside the static zone or within radius of any
    /// historical report. The dynamic check short-circuits on first match;
    /// a lookup failure is logged and leaves the static result standing.
    pub async fn is_in_danger_zone(&self, point: Coordinate) -> bool {
        if self.static_zone.contains(point) {
            return true;
        }

        let bbox = BoundingBox::around(point, self.radius_meters);
        match self.history.candidates_near(bbox).await {
            Ok(candidates) => candidates
                .into_iter()
                .any(|c| distance_meters(point, c) <= self.radius_meters),
            Err(e) => {
                tracing::warn!(error = %e, "Zone history lookup failed, static zone only");
                false
            }
        }
    }
}
