// SPDX-License-Identifier: MIT

//! Local-filesystem storage for report artifacts.
//!
//! Each session gets its own directory under the configured data root;
//! artifacts are plain files inside it.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::ReportCategory;
use crate::time_utils::format_utc_compact;

/// Destination directory for one report session.
///
/// Created once at session start and immutable afterwards.
#[derive(Debug, Clone)]
pub struct StorageTarget {
    dir: PathBuf,
}

impl StorageTarget {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one artifact file into the target directory.
    pub async fn write(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        let path = self.dir.join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Upstream(format!("storage write {}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Artifact written");
        Ok(())
    }
}

/// Provisions per-session storage directories.
#[derive(Debug, Clone)]
pub struct StorageProvisioner {
    root: PathBuf,
}

impl StorageProvisioner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a fresh directory for a session.
    ///
    /// The name combines category, user and timestamp so concurrent
    /// sessions of different users never collide.
    pub async fn provision(
        &self,
        category: ReportCategory,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<StorageTarget> {
        let name = format!("{}-{}-{}", category.as_str(), user_id, format_utc_compact(now));
        let dir = self.root.join(name);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Upstream(format!("provision {}: {}", dir.display(), e)))?;
        tracing::info!(dir = %dir.display(), "Report storage provisioned");
        Ok(StorageTarget::new(dir))
    }
}
