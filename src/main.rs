// SPDX-License-Identifier: MIT

//! Fieldwatch API Server
//!
//! Chat-bot backend that tracks users against danger zones, pushes
//! rate-limited proximity warnings, and assembles photo + location + notes
//! field reports into downloadable archives.

use fieldwatch::{
    config::Config,
    services::{
        chat::HttpDeliveryWebhook, AlertEngine, ChatApiClient, DeliveryWebhook, ReportFinalizer,
        ReportHistory, ReportRegistry, StaticZone, StorageProvisioner, ZoneEvaluator,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Fieldwatch API");

    // Chat platform client: notifier, profile resolver and media fetcher.
    let chat = Arc::new(ChatApiClient::new(config.channel_access_token.clone()));

    // Danger-zone evaluation: static configured zone plus zones derived
    // from finalized reports.
    let history = Arc::new(ReportHistory::new(config.zone_history_window_hours));
    let static_zone = StaticZone {
        center: config.danger_zone_center,
        radius_meters: config.danger_zone_radius_meters,
    };
    let zones = ZoneEvaluator::new(static_zone, history.clone());
    tracing::info!(
        lat = static_zone.center.lat,
        lng = static_zone.center.lng,
        radius_m = static_zone.radius_meters,
        "Static danger zone configured"
    );

    let alert_engine = AlertEngine::new(
        zones,
        chat.clone(),
        config.alert_cooldown(),
        config.idle_timeout(),
    );

    // Report capture flow.
    let provisioner = StorageProvisioner::new(&config.data_dir);
    let stale_after = config.evict_stale_sessions.then(|| config.idle_timeout());
    let reports = ReportRegistry::new(provisioner, chat.clone(), stale_after);

    let delivery_webhook: Option<Arc<dyn DeliveryWebhook>> = config
        .delivery_webhook_url
        .clone()
        .map(|url| Arc::new(HttpDeliveryWebhook::new(url)) as Arc<dyn DeliveryWebhook>);
    let finalizer = ReportFinalizer::new(
        &config.archive_dir,
        config.public_url.clone(),
        history,
        delivery_webhook,
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        alert_engine,
        reports,
        finalizer,
        notifier: chat.clone(),
        media: chat,
    });

    spawn_eviction_sweep(state.clone());

    // Build router
    let app = fieldwatch::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodic eviction of idle tracking state and (when enabled) abandoned
/// report sessions. Runs independently of request traffic.
fn spawn_eviction_sweep(state: Arc<AppState>) {
    let interval = std::time::Duration::from_secs(state.config.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let now = chrono::Utc::now();

            let evicted = state.alert_engine.sweep_idle(now).await;
            if !evicted.is_empty() {
                tracing::info!(count = evicted.len(), "Idle tracking sweep done");
            }

            let stale = state.reports.sweep_stale(now);
            if !stale.is_empty() {
                tracing::info!(count = stale.len(), "Stale session sweep done");
            }
        }
    });
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fieldwatch=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
