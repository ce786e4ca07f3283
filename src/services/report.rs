// SPDX-License-Identifier: MIT

//! Report session registry.
//!
//! Holds at most one live session per user and owns the full lifecycle:
//! Idle -> Collecting -> Completed -> removed. The completion transition
//! happens exactly once; the winning `submit_artifact` call receives the
//! removed session so its caller can trigger finalization.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{Artifact, ReportCategory, ReportSession, SubmitOutcome};
use crate::services::chat::ProfileResolver;
use crate::services::storage::StorageProvisioner;

/// Artifact filenames inside a session's storage directory.
const PHOTO_FILE: &str = "photo.jpg";
const LOCATION_FILE: &str = "location.txt";
const NOTES_FILE: &str = "notes.txt";
const REPORTER_FILE: &str = "reporter.txt";

/// Process-wide user -> active session map.
pub struct ReportRegistry {
    sessions: DashMap<String, ReportSession>,
    provisioner: StorageProvisioner,
    profiles: Arc<dyn ProfileResolver>,
    /// Age after which the sweep may evict an abandoned session; `None`
    /// means abandoned sessions live until completed.
    stale_after: Option<Duration>,
}

impl ReportRegistry {
    pub fn new(
        provisioner: StorageProvisioner,
        profiles: Arc<dyn ProfileResolver>,
        stale_after: Option<Duration>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            provisioner,
            profiles,
            stale_after,
        }
    }

    pub fn has_session(&self, user_id: &str) -> bool {
        self.sessions.contains_key(user_id)
    }

    /// Start a new report session for a user.
    ///
    /// Provisions storage, resolves the reporter's display name
    /// (best-effort) and writes it as the session's first record. Fails
    /// with `AlreadyActive` if a session exists; the existing session is
    /// left untouched.
    pub async fn start_session(
        &self,
        user_id: &str,
        category: ReportCategory,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.sessions.contains_key(user_id) {
            return Err(AppError::AlreadyActive);
        }

        let display_name = self.profiles.resolve_display_name(user_id).await;
        let storage = self.provisioner.provision(category, user_id, now).await?;
        storage.write(REPORTER_FILE, display_name.as_bytes()).await?;

        let session = ReportSession::new(category, storage, display_name, now);

        // Re-check under the entry lock: a racing start may have won while
        // we were provisioning.
        match self.sessions.entry(user_id.to_string()) {
            Entry::Occupied(_) => Err(AppError::AlreadyActive),
            Entry::Vacant(vacant) => {
                vacant.insert(session);
                tracing::info!(user_id, category = category.as_str(), "Report session started");
                Ok(())
            }
        }
    }

    /// Submit one artifact from either input channel.
    ///
    /// The storage write happens first; only a successful write sets the
    /// completion flag, so a failed write implicitly re-asks the user. The
    /// flag merge runs as a synchronous critical section under the map
    /// entry lock, and the Completed transition is claimed atomically via
    /// `remove_if`, so exactly one caller gets the completed session back.
    pub async fn submit_artifact(
        &self,
        user_id: &str,
        artifact: Artifact,
        now: DateTime<Utc>,
    ) -> Result<(SubmitOutcome, Option<ReportSession>)> {
        let storage = match self.sessions.get(user_id) {
            Some(session) => session.storage.clone(),
            None => return Err(AppError::NoActiveSession),
        };

        match &artifact {
            Artifact::Photo(bytes) => storage.write(PHOTO_FILE, bytes).await?,
            Artifact::Location(coord) => {
                let line = format!("{},{}", coord.lat, coord.lng);
                storage.write(LOCATION_FILE, line.as_bytes()).await?
            }
            Artifact::Notes(text) => storage.write(NOTES_FILE, text.as_bytes()).await?,
        }

        // Critical section: no awaits between reading and writing flags.
        let completed = {
            let mut session = match self.sessions.get_mut(user_id) {
                Some(session) => session,
                // Completed (and removed) while our write was in flight.
                None => return Err(AppError::NoActiveSession),
            };
            match artifact {
                Artifact::Photo(_) => session.has_photo = true,
                Artifact::Location(coord) => {
                    session.has_location = true;
                    session.coordinate = Some(coord);
                }
                Artifact::Notes(text) => {
                    session.has_notes = true;
                    session.notes = Some(text);
                }
            }
            session.updated_at = now;
            session.is_complete()
        };

        if !completed {
            return Ok((
                SubmitOutcome {
                    accepted: true,
                    completed: false,
                },
                None,
            ));
        }

        // Only one of several racing submitters wins the removal.
        let won = self
            .sessions
            .remove_if(user_id, |_, session| session.is_complete());

        match won {
            Some((_, session)) => {
                tracing::info!(user_id, "Report session completed");
                Ok((
                    SubmitOutcome {
                        accepted: true,
                        completed: true,
                    },
                    Some(session),
                ))
            }
            None => Ok((
                SubmitOutcome {
                    accepted: true,
                    completed: false,
                },
                None,
            )),
        }
    }

    /// Evict sessions untouched for longer than the configured stale age.
    ///
    /// No-op unless stale eviction was enabled. Keys are snapshotted
    /// before mutation.
    pub fn sweep_stale(&self, now: DateTime<Utc>) -> Vec<String> {
        let Some(stale_after) = self.stale_after else {
            return Vec::new();
        };
        let cutoff = chrono::Duration::from_std(stale_after).unwrap_or_default();

        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| now.signed_duration_since(entry.value().updated_at) >= cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = Vec::new();
        for user_id in stale {
            // Skip sessions that completed or were updated since the snapshot.
            let removed = self.sessions.remove_if(&user_id, |_, session| {
                now.signed_duration_since(session.updated_at) >= cutoff
            });
            if removed.is_some() {
                tracing::info!(user_id = %user_id, "Stale report session evicted");
                evicted.push(user_id);
            }
        }
        evicted
    }
}
