// SPDX-License-Identifier: MIT

//! Fieldwatch: chat-bot backend for danger-zone alerts and field reports.
//!
//! This crate provides the backend that tracks opted-in users against
//! danger zones, pushes rate-limited proximity warnings, and walks users
//! through the photo + location + notes report capture flow.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use services::chat::{MediaFetcher, Notifier};
use services::{AlertEngine, ReportFinalizer, ReportRegistry};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub alert_engine: AlertEngine,
    pub reports: ReportRegistry,
    pub finalizer: ReportFinalizer,
    pub notifier: Arc<dyn Notifier>,
    pub media: Arc<dyn MediaFetcher>,
}
