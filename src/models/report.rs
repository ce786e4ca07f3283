// SPDX-License-Identifier: MIT

//! Field report session model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Coordinate;
use crate::services::storage::StorageTarget;

/// Report category chosen when the user starts a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportCategory {
    Wildlife,
    Hazard,
}

impl ReportCategory {
    /// Stable tag used in directory names and webhook payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCategory::Wildlife => "wildlife",
            ReportCategory::Hazard => "hazard",
        }
    }
}

/// The three artifacts collected for one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Photo,
    Location,
    Notes,
}

/// One in-progress report for one user.
///
/// Completion flags are monotonic: once an artifact kind has been accepted
/// its flag never resets, even if a later duplicate overwrites the value.
#[derive(Debug, Clone)]
pub struct ReportSession {
    pub category: ReportCategory,
    /// Destination directory, provisioned once at session start.
    pub storage: StorageTarget,
    /// Best-effort display name; empty when the profile lookup failed.
    pub display_name: String,

    pub has_photo: bool,
    pub has_location: bool,
    pub has_notes: bool,

    pub coordinate: Option<Coordinate>,
    pub notes: Option<String>,

    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportSession {
    pub fn new(
        category: ReportCategory,
        storage: StorageTarget,
        display_name: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            storage,
            display_name,
            has_photo: false,
            has_location: false,
            has_notes: false,
            coordinate: None,
            notes: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// A session is complete once all three artifacts have arrived.
    pub fn is_complete(&self) -> bool {
        self.has_photo && self.has_location && self.has_notes
    }
}

/// An artifact value arriving from either input channel.
#[derive(Debug, Clone)]
pub enum Artifact {
    Photo(Vec<u8>),
    Location(Coordinate),
    Notes(String),
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Photo(_) => ArtifactKind::Photo,
            Artifact::Location(_) => ArtifactKind::Location,
            Artifact::Notes(_) => ArtifactKind::Notes,
        }
    }
}

/// Outcome of an artifact submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub accepted: bool,
    /// True only for the single call that completed the session.
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ReportSession {
        ReportSession::new(
            ReportCategory::Wildlife,
            StorageTarget::new("/tmp/fieldwatch-test".into()),
            "Tester".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn fresh_session_is_incomplete() {
        let s = session();
        assert!(!s.is_complete());
    }

    #[test]
    fn complete_requires_all_three_flags() {
        let mut s = session();
        s.has_photo = true;
        s.has_location = true;
        assert!(!s.is_complete());
        s.has_notes = true;
        assert!(s.is_complete());
    }

    #[test]
    fn category_tags_are_stable() {
        assert_eq!(ReportCategory::Wildlife.as_str(), "wildlife");
        assert_eq!(ReportCategory::Hazard.as_str(), "hazard");
    }
}
