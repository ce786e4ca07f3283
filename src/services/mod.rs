// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod alerts;
pub mod chat;
pub mod finalize;
pub mod geofence;
pub mod report;
pub mod storage;
pub mod throttle;

pub use alerts::AlertEngine;
pub use chat::{ChatApiClient, DeliveryWebhook, HttpDeliveryWebhook, MediaFetcher, Notifier, ProfileResolver};
pub use finalize::{DownloadReference, ReportFinalizer};
pub use geofence::{ReportHistory, StaticZone, ZoneEvaluator, ZoneHistoryLookup};
pub use report::ReportRegistry;
pub use storage::{StorageProvisioner, StorageTarget};
pub use throttle::AlertThrottle;
