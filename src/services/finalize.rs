// SPDX-License-Identifier: MIT

//! Report finalization.
//!
//! Runs once per completed session: writes the metadata record, packages
//! the storage directory into a downloadable zip, feeds the report into
//! the danger-zone history, and notifies the optional delivery webhook.
//! Exactly-once invocation is guaranteed by the registry's atomic removal,
//! not here.

use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::ReportSession;
use crate::services::chat::DeliveryWebhook;
use crate::services::geofence::ReportHistory;
use crate::time_utils::format_utc_rfc3339;

/// Metadata record filename inside the report directory.
const METADATA_FILE: &str = "report.txt";

/// Reference to a packaged report archive.
#[derive(Debug, Clone)]
pub struct DownloadReference {
    /// Public URL of the archive.
    pub url: String,
    /// Archive filename.
    pub filename: String,
    /// Local path of the archive.
    pub path: PathBuf,
}

/// Packages completed report sessions.
pub struct ReportFinalizer {
    archive_dir: PathBuf,
    public_url: String,
    history: Arc<ReportHistory>,
    webhook: Option<Arc<dyn DeliveryWebhook>>,
}

impl ReportFinalizer {
    pub fn new(
        archive_dir: impl Into<PathBuf>,
        public_url: String,
        history: Arc<ReportHistory>,
        webhook: Option<Arc<dyn DeliveryWebhook>>,
    ) -> Self {
        Self {
            archive_dir: archive_dir.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
            history,
            webhook,
        }
    }

    /// Finalize one completed session.
    ///
    /// The metadata write and the packaging must succeed; the webhook
    /// notification is best-effort and never rolls either back.
    pub async fn finalize(&self, session: &ReportSession, now: DateTime<Utc>) -> Result<DownloadReference> {
        let metadata = render_metadata(session, now);
        session
            .storage
            .write(METADATA_FILE, metadata.as_bytes())
            .await?;

        let reference = self.package(session).await?;

        if let Some(coordinate) = session.coordinate {
            self.history.record(coordinate, now);
        }

        if let Some(webhook) = &self.webhook {
            if let Err(e) = webhook
                .notify(&reference.url, &reference.filename, session.category.as_str())
                .await
            {
                tracing::warn!(error = %e, "Delivery webhook notify failed");
            }
        }

        tracing::info!(
            archive = %reference.path.display(),
            category = session.category.as_str(),
            "Report finalized"
        );
        Ok(reference)
    }

    /// Zip the session directory into the archive dir.
    async fn package(&self, session: &ReportSession) -> Result<DownloadReference> {
        let dir = session.storage.dir().to_path_buf();
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("storage dir has no name")))?;
        let filename = format!("{}.zip", dir_name);
        let archive_path = self.archive_dir.join(&filename);

        tokio::fs::create_dir_all(&self.archive_dir)
            .await
            .map_err(|e| AppError::Upstream(format!("archive dir: {}", e)))?;

        let out = archive_path.clone();
        tokio::task::spawn_blocking(move || zip_directory(&dir, &out))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("packaging task: {}", e)))??;

        Ok(DownloadReference {
            url: format!("{}/archives/{}", self.public_url, filename),
            filename,
            path: archive_path,
        })
    }
}

/// Render the fixed-order metadata record: display name, coordinate,
/// capture timestamp, notes. One field per line; absent optionals render
/// as empty lines, never omitted.
fn render_metadata(session: &ReportSession, now: DateTime<Utc>) -> String {
    let coordinate = session
        .coordinate
        .map(|c| format!("{},{}", c.lat, c.lng))
        .unwrap_or_default();
    let notes = session.notes.as_deref().unwrap_or("");

    format!(
        "{}\n{}\n{}\n{}\n",
        session.display_name,
        coordinate,
        format_utc_rfc3339(now),
        notes
    )
}

/// Write all files of a flat directory into a deflate-compressed zip.
fn zip_directory(dir: &Path, out: &Path) -> Result<()> {
    let file = File::create(out)
        .map_err(|e| AppError::Upstream(format!("archive create {}: {}", out.display(), e)))?;
    let mut zip_writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let entries = std::fs::read_dir(dir)
        .map_err(|e| AppError::Upstream(format!("archive read {}: {}", dir.display(), e)))?;

    let mut buffer = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AppError::Upstream(format!("archive read: {}", e)))?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();

        zip_writer
            .start_file(&name, options)
            .map_err(|e| AppError::Upstream(format!("archive entry {}: {}", name, e)))?;

        buffer.clear();
        File::open(entry.path())
            .and_then(|mut f| f.read_to_end(&mut buffer))
            .map_err(|e| AppError::Upstream(format!("archive entry {}: {}", name, e)))?;
        zip_writer
            .write_all(&buffer)
            .map_err(|e| AppError::Upstream(format!("archive entry {}: {}", name, e)))?;
    }

    zip_writer
        .finish()
        .map_err(|e| AppError::Upstream(format!("archive finish: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, ReportCategory};
    use crate::services::storage::StorageTarget;
    use chrono::TimeZone;

    fn session_with(coordinate: Option<Coordinate>, notes: Option<&str>) -> ReportSession {
        let mut session = ReportSession::new(
            ReportCategory::Wildlife,
            StorageTarget::new("/tmp/unused".into()),
            "Ada".to_string(),
            Utc::now(),
        );
        session.coordinate = coordinate;
        session.notes = notes.map(|n| n.to_string());
        session
    }

    fn capture_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 2, 14, 30, 0).unwrap()
    }

    #[test]
    fn metadata_has_fixed_field_order() {
        let session = session_with(
            Some(Coordinate::new(25.01845, 121.54274)),
            Some("two boars near the creek"),
        );
        let rendered = render_metadata(&session, capture_time());

        assert_eq!(
            rendered,
            "Ada\n25.01845,121.54274\n2026-05-02T14:30:00Z\ntwo boars near the creek\n"
        );
    }

    #[test]
    fn metadata_keeps_empty_lines_for_absent_fields() {
        let mut session = session_with(None, None);
        session.display_name = String::new();
        let rendered = render_metadata(&session, capture_time());

        // Four lines, all present even when empty.
        assert_eq!(rendered, "\n\n2026-05-02T14:30:00Z\n\n");
        assert_eq!(rendered.lines().count(), 4);
    }

    #[test]
    fn zip_directory_packages_all_files() {
        let root = std::env::temp_dir().join("fieldwatch_zip_test");
        let _ = std::fs::remove_dir_all(&root);
        let src = root.join("wildlife-U1-20260502-143000");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("notes.txt"), b"notes").unwrap();
        std::fs::write(src.join("photo.jpg"), b"\xff\xd8\xff").unwrap();

        let out = root.join("report.zip");
        zip_directory(&src, &out).expect("zip should succeed");

        let archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let mut names: Vec<_> = archive.file_names().map(|n| n.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["notes.txt", "photo.jpg"]);

        let _ = std::fs::remove_dir_all(&root);
    }
}
