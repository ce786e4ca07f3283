// SPDX-License-Identifier: MIT

//! Webhook route for chat platform events.

use crate::error::AppError;
use crate::models::{Artifact, Command, ReportCategory, WebhookBody};
use crate::routes::submit_and_finalize;
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Router};
use chrono::Utc;
use std::sync::Arc;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhook", post(handle_events))
}

/// Handle a webhook delivery (POST).
///
/// Every downstream failure is caught and logged here; the handler always
/// acknowledges with 200 so the platform does not retry the delivery.
async fn handle_events(State(state): State<Arc<AppState>>, body: axum::body::Bytes) -> StatusCode {
    let body: WebhookBody = match serde_json::from_slice(&body) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse webhook body");
            return StatusCode::OK; // Still ack to avoid retry storms
        }
    };

    for event in &body.events {
        let Some(user_id) = event.user_id() else {
            tracing::debug!(event_type = %event.event_type, "Event without user id ignored");
            continue;
        };
        let Some(command) = event.to_command() else {
            tracing::debug!(event_type = %event.event_type, "Unhandled event kind ignored");
            continue;
        };

        handle_command(&state, user_id, event.reply_token.as_deref(), command).await;
    }

    StatusCode::OK
}

/// Dispatch one boundary command.
async fn handle_command(
    state: &AppState,
    user_id: &str,
    reply_token: Option<&str>,
    command: Command,
) {
    let now = Utc::now();

    match command {
        Command::EnableTracking => {
            let text = if state.alert_engine.enable_tracking(user_id, now) {
                "\u{2705} Location tracking enabled! Open the tracker page to start sharing."
            } else {
                "Location tracking is already enabled."
            };
            reply(state, user_id, reply_token, text).await;
        }
        Command::DisableTracking => {
            let text = if state.alert_engine.disable_tracking(user_id) {
                "Location tracking disabled."
            } else {
                "Location tracking was not enabled."
            };
            reply(state, user_id, reply_token, text).await;
        }
        Command::StartReport(category) => {
            start_report(state, user_id, reply_token, category, now).await;
        }
        Command::Note(text) => {
            submit_and_finalize(state, user_id, Artifact::Notes(text)).await;
        }
        Command::Photo { message_id } => {
            // A failed fetch leaves the photo flag unset, so the user is
            // implicitly asked to resend.
            match state.media.fetch_content(&message_id).await {
                Ok(bytes) => submit_and_finalize(state, user_id, Artifact::Photo(bytes)).await,
                Err(e) => {
                    tracing::warn!(user_id, message_id = %message_id, error = %e, "Photo fetch failed")
                }
            }
        }
        Command::Position(coordinate) => {
            // A shared location feeds both subsystems.
            state
                .alert_engine
                .on_position_sample(user_id, coordinate, now, reply_token)
                .await;
            submit_and_finalize(state, user_id, Artifact::Location(coordinate)).await;
        }
    }
}

/// Start a report session, informing the user of the outcome.
async fn start_report(
    state: &AppState,
    user_id: &str,
    reply_token: Option<&str>,
    category: ReportCategory,
    now: chrono::DateTime<Utc>,
) {
    match state.reports.start_session(user_id, category, now).await {
        Ok(()) => {
            reply(
                state,
                user_id,
                reply_token,
                "Report started. Send a photo, share your location, and add a short note.",
            )
            .await;
        }
        Err(AppError::AlreadyActive) => {
            reply(
                state,
                user_id,
                reply_token,
                "You already have a report in progress. Finish it before starting another.",
            )
            .await;
        }
        Err(e) => {
            tracing::error!(user_id, error = %e, "Failed to start report session");
        }
    }
}

/// Reply on the synchronous channel when available, push otherwise.
async fn reply(state: &AppState, user_id: &str, reply_token: Option<&str>, text: &str) {
    let sent = match reply_token {
        Some(token) => state.notifier.send_immediate(token, text).await,
        None => state.notifier.send_deferred(user_id, text).await,
    };
    if let Err(e) = sent {
        tracing::warn!(user_id, error = %e, "Reply failed");
    }
}
