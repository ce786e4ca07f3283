// SPDX-License-Identifier: MIT

//! HTTP route handlers.

pub mod location;
pub mod webhook;

use crate::error::AppError;
use crate::middleware::signature::verify_signature;
use crate::models::Artifact;
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Submit an artifact from either input channel; if it completes the
/// session, finalize it and push the completion notice.
///
/// Finalization is triggered here, by the channel that delivered the last
/// artifact, never by the registry itself. A stray artifact with no
/// active session is silently ignored.
pub(crate) async fn submit_and_finalize(state: &AppState, user_id: &str, artifact: Artifact) {
    let now = Utc::now();
    let kind = artifact.kind();

    match state.reports.submit_artifact(user_id, artifact, now).await {
        Ok((outcome, Some(session))) if outcome.completed => {
            let reference = match state.finalizer.finalize(&session, now).await {
                Ok(reference) => reference,
                Err(e) => {
                    tracing::error!(user_id, error = %e, "Report finalization failed");
                    return;
                }
            };

            let text = format!(
                "\u{2705} Your {} report is complete! Download: {}",
                session.category.as_str(),
                reference.url
            );
            if let Err(e) = state.notifier.send_deferred(user_id, &text).await {
                tracing::warn!(user_id, error = %e, "Completion notice failed");
            }
        }
        Ok(_) => {
            tracing::debug!(user_id, kind = ?kind, "Artifact accepted");
        }
        Err(AppError::NoActiveSession) => {
            tracing::debug!(user_id, kind = ?kind, "Artifact without active session ignored");
        }
        Err(e) => {
            tracing::warn!(user_id, kind = ?kind, error = %e, "Artifact submission failed");
        }
    }
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // The beacon page runs inside the chat app's browser view, so the
    // location endpoint accepts cross-origin posts.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // Webhook deliveries must carry a valid channel signature.
    let webhook_routes = webhook::routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        verify_signature,
    ));

    Router::new()
        .route("/health", get(health_check))
        .merge(location::routes())
        .merge(webhook_routes)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
