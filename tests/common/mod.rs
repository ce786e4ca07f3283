// SPDX-License-Identifier: MIT

//! Shared test fixtures: mock collaborators and app state builders.

use async_trait::async_trait;
use fieldwatch::config::Config;
use fieldwatch::error::{AppError, Result};
use fieldwatch::models::{BoundingBox, Coordinate};
use fieldwatch::services::chat::{MediaFetcher, Notifier, ProfileResolver};
use fieldwatch::services::{
    AlertEngine, ReportFinalizer, ReportHistory, ReportRegistry, StaticZone, StorageProvisioner,
    ZoneEvaluator, ZoneHistoryLookup,
};
use fieldwatch::AppState;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Center of the test danger zone (matches `Config::default`).
#[allow(dead_code)]
pub const ZONE_CENTER: Coordinate = Coordinate {
    lat: 25.01845,
    lng: 121.54274,
};

/// A point well outside the 50m test zone (~5km away).
#[allow(dead_code)]
pub const FAR_AWAY: Coordinate = Coordinate {
    lat: 25.06345,
    lng: 121.54274,
};

/// One delivered mock message.
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// True for push delivery, false for a reply-token send.
    pub deferred: bool,
    pub target: String,
    pub text: String,
}

/// Notifier that records sends and can be switched to fail.
#[derive(Default)]
pub struct MockNotifier {
    pub fail: AtomicBool,
    pub sent: Mutex<Vec<SentMessage>>,
}

impl MockNotifier {
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    #[allow(dead_code)]
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, deferred: bool, target: &str, text: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("mock notifier down".to_string()));
        }
        self.sent.lock().unwrap().push(SentMessage {
            deferred,
            target: target.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_immediate(&self, reply_token: &str, text: &str) -> Result<()> {
        self.record(false, reply_token, text)
    }

    async fn send_deferred(&self, user_id: &str, text: &str) -> Result<()> {
        self.record(true, user_id, text)
    }
}

/// Profile resolver returning a fixed display name.
pub struct MockProfiles {
    pub name: String,
}

impl MockProfiles {
    pub fn named(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
        })
    }
}

#[async_trait]
impl ProfileResolver for MockProfiles {
    async fn resolve_display_name(&self, _user_id: &str) -> String {
        self.name.clone()
    }
}

/// Media fetcher serving fixed bytes.
#[allow(dead_code)]
pub struct MockMedia {
    pub bytes: Vec<u8>,
    pub fail: AtomicBool,
}

impl MockMedia {
    #[allow(dead_code)]
    pub fn with_bytes(bytes: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            bytes: bytes.to_vec(),
            fail: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl MediaFetcher for MockMedia {
    async fn fetch_content(&self, _message_id: &str) -> Result<Vec<u8>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("mock media down".to_string()));
        }
        Ok(self.bytes.clone())
    }
}

/// History lookup that fails on every call.
#[allow(dead_code)]
pub struct FailingHistory;

#[async_trait]
impl ZoneHistoryLookup for FailingHistory {
    async fn candidates_near(&self, _bbox: BoundingBox) -> Result<Vec<Coordinate>> {
        Err(AppError::Upstream("history store down".to_string()))
    }
}

/// Fresh scratch directory for one test.
pub fn scratch_dir(test_name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fieldwatch_{}", test_name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Test config rooted in a scratch directory.
pub fn test_config(root: &std::path::Path) -> Config {
    Config {
        data_dir: root.join("reports").to_string_lossy().to_string(),
        archive_dir: root.join("archives").to_string_lossy().to_string(),
        alert_cooldown_secs: 15,
        ..Config::default()
    }
}

/// Full application state wired with mock chat collaborators.
#[allow(dead_code)]
pub fn build_state(root: &std::path::Path, notifier: Arc<MockNotifier>) -> Arc<AppState> {
    let config = test_config(root);

    let history = Arc::new(ReportHistory::new(None));
    let static_zone = StaticZone {
        center: config.danger_zone_center,
        radius_meters: config.danger_zone_radius_meters,
    };
    let zones = ZoneEvaluator::new(static_zone, history.clone());

    let alert_engine = AlertEngine::new(
        zones,
        notifier.clone(),
        config.alert_cooldown(),
        config.idle_timeout(),
    );

    let provisioner = StorageProvisioner::new(&config.data_dir);
    let reports = ReportRegistry::new(provisioner, MockProfiles::named("Ada"), None);
    let finalizer = ReportFinalizer::new(&config.archive_dir, config.public_url.clone(), history, None);

    Arc::new(AppState {
        config,
        alert_engine,
        reports,
        finalizer,
        notifier,
        media: MockMedia::with_bytes(b"\xff\xd8\xff test-jpeg"),
    })
}
