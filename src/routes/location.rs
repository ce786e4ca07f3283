// SPDX-License-Identifier: MIT

//! Standalone position-beacon endpoint.
//!
//! The tracker page posts the user's GPS position on a timer. Samples
//! feed the alert engine and, when a report session is collecting, double
//! as the location artifact.

use crate::error::{AppError, Result};
use crate::models::{Artifact, Coordinate};
use crate::routes::submit_and_finalize;
use crate::AppState;
use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Location routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/location", post(handle_position))
}

/// Position report from the beacon page.
#[derive(Debug, Deserialize)]
struct PositionReport {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Serialize)]
struct PositionAck {
    status: String,
}

/// Handle one position sample (POST).
///
/// Downstream failures are logged, never surfaced: once the payload is
/// well-formed the beacon always gets a 200 so it keeps reporting.
async fn handle_position(
    State(state): State<Arc<AppState>>,
    Json(report): Json<PositionReport>,
) -> Result<Json<PositionAck>> {
    let (user_id, lat, lng) = match (report.user_id, report.latitude, report.longitude) {
        (Some(u), Some(lat), Some(lng)) if !u.is_empty() => (u, lat, lng),
        _ => return Err(AppError::BadRequest("Missing required fields".to_string())),
    };

    let coordinate = Coordinate::new(lat, lng);
    let now = Utc::now();

    // Beacon samples have no reply channel; alerts go out as pushes.
    state
        .alert_engine
        .on_position_sample(&user_id, coordinate, now, None)
        .await;

    submit_and_finalize(&state, &user_id, Artifact::Location(coordinate)).await;

    Ok(Json(PositionAck {
        status: "ok".to_string(),
    }))
}
