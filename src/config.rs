// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! Credentials for the chat platform are required; everything else has a
//! sensible default so local development only needs the two channel vars.

use std::env;
use std::time::Duration;

use crate::models::Coordinate;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Chat platform credentials (required) ---
    /// Bearer token for the messaging API (reply/push/profile/content).
    pub channel_access_token: String,
    /// Channel secret used to verify webhook signatures.
    pub channel_secret: String,

    // --- Server ---
    /// Server port
    pub port: u16,
    /// Public base URL used when building download references.
    pub public_url: String,

    // --- Danger zone ---
    /// Static fallback danger zone center.
    pub danger_zone_center: Coordinate,
    /// Danger zone radius in meters (static and dynamic zones).
    pub danger_zone_radius_meters: f64,
    /// Age limit for dynamic-zone history candidates; `None` = all history.
    pub zone_history_window_hours: Option<u32>,

    // --- Alerting ---
    /// Minimum time between two alerts to the same user.
    pub alert_cooldown_secs: u64,
    /// Tracking state older than this is evicted by the sweep.
    pub idle_timeout_secs: u64,
    /// Interval between eviction sweeps.
    pub sweep_interval_secs: u64,

    // --- Reports ---
    /// Root directory for in-progress report artifacts.
    pub data_dir: String,
    /// Directory for packaged report archives.
    pub archive_dir: String,
    /// Whether the sweep also evicts abandoned report sessions.
    pub evict_stale_sessions: bool,
    /// Optional operational webhook notified with each download reference.
    pub delivery_webhook_url: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            channel_access_token: "test_channel_token".to_string(),
            channel_secret: "test_channel_secret".to_string(),
            port: 8080,
            public_url: "http://localhost:8080".to_string(),
            danger_zone_center: Coordinate {
                lat: 25.01845,
                lng: 121.54274,
            },
            danger_zone_radius_meters: 50.0,
            zone_history_window_hours: None,
            alert_cooldown_secs: 60,
            idle_timeout_secs: 1800,
            sweep_interval_secs: 300,
            data_dir: "data/reports".to_string(),
            archive_dir: "data/archives".to_string(),
            evict_stale_sessions: false,
            delivery_webhook_url: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            channel_access_token: env::var("CHANNEL_ACCESS_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("CHANNEL_ACCESS_TOKEN"))?,
            channel_secret: env::var("CHANNEL_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("CHANNEL_SECRET"))?,

            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),

            danger_zone_center: Coordinate {
                lat: parse_env("DANGER_ZONE_LAT", 25.01845)?,
                lng: parse_env("DANGER_ZONE_LNG", 121.54274)?,
            },
            danger_zone_radius_meters: parse_env("DANGER_ZONE_RADIUS_METERS", 50.0)?,
            zone_history_window_hours: match env::var("ZONE_HISTORY_WINDOW_HOURS") {
                Ok(v) => Some(
                    v.parse()
                        .map_err(|_| ConfigError::Invalid("ZONE_HISTORY_WINDOW_HOURS"))?,
                ),
                Err(_) => None,
            },

            alert_cooldown_secs: parse_env("ALERT_COOLDOWN_SECS", 60)?,
            idle_timeout_secs: parse_env("IDLE_TIMEOUT_SECS", 1800)?,
            sweep_interval_secs: parse_env("SWEEP_INTERVAL_SECS", 300)?,

            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data/reports".to_string()),
            archive_dir: env::var("ARCHIVE_DIR").unwrap_or_else(|_| "data/archives".to_string()),
            evict_stale_sessions: env::var("EVICT_STALE_SESSIONS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            delivery_webhook_url: env::var("DELIVERY_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.is_empty()),
        })
    }

    /// Alert cooldown as a `Duration`.
    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_secs(self.alert_cooldown_secs)
    }

    /// Idle timeout as a `Duration`.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Parse an optional env var, falling back to a default when unset.
fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(v) => v.parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
