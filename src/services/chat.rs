// SPDX-License-Identifier: MIT

//! Chat platform collaborators.
//!
//! The core only depends on the narrow traits below; `ChatApiClient` is the
//! production implementation against a LINE-style messaging API. Tests
//! substitute mocks.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Outbound message delivery.
///
/// `send_immediate` uses the one-shot reply channel of the triggering
/// event; `send_deferred` is an unsolicited push.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_immediate(&self, reply_token: &str, text: &str) -> Result<()>;
    async fn send_deferred(&self, user_id: &str, text: &str) -> Result<()>;
}

/// Best-effort display-name lookup.
#[async_trait]
pub trait ProfileResolver: Send + Sync {
    /// Resolve a user's display name; empty string when unavailable.
    async fn resolve_display_name(&self, user_id: &str) -> String;
}

/// Fetches binary message content (photos) by message id.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch_content(&self, message_id: &str) -> Result<Vec<u8>>;
}

/// Optional operational webhook receiving finished-report references.
#[async_trait]
pub trait DeliveryWebhook: Send + Sync {
    async fn notify(&self, reference: &str, filename: &str, category: &str) -> Result<()>;
}

/// Messaging API client (reply, push, profile, message content).
#[derive(Clone)]
pub struct ChatApiClient {
    http: reqwest::Client,
    base_url: String,
    content_base_url: String,
    access_token: String,
}

impl ChatApiClient {
    /// Create a client with the channel access token.
    pub fn new(access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://api.line.me/v2/bot".to_string(),
            content_base_url: "https://api-data.line.me/v2/bot".to_string(),
            access_token,
        }
    }

    /// Point the client at a different API host (tests, self-hosted stubs).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self.content_base_url = self.base_url.clone();
        self
    }

    async fn post_message(&self, endpoint: &str, body: serde_json::Value) -> Result<()> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("chat api: {}", e)))?;

        check_response(response).await
    }
}

/// Check response status and return an upstream error if not successful.
async fn check_response(response: reqwest::Response) -> Result<()> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Upstream(format!(
        "chat api {}: {}",
        status, body
    )))
}

#[async_trait]
impl Notifier for ChatApiClient {
    async fn send_immediate(&self, reply_token: &str, text: &str) -> Result<()> {
        self.post_message(
            "/message/reply",
            serde_json::json!({
                "replyToken": reply_token,
                "messages": [{ "type": "text", "text": text }],
            }),
        )
        .await
    }

    async fn send_deferred(&self, user_id: &str, text: &str) -> Result<()> {
        self.post_message(
            "/message/push",
            serde_json::json!({
                "to": user_id,
                "messages": [{ "type": "text", "text": text }],
            }),
        )
        .await
    }
}

#[derive(Deserialize)]
struct Profile {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[async_trait]
impl ProfileResolver for ChatApiClient {
    async fn resolve_display_name(&self, user_id: &str) -> String {
        let url = format!("{}/profile/{}", self.base_url, user_id);
        let result = async {
            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.access_token)
                .send()
                .await
                .map_err(|e| AppError::Upstream(format!("profile: {}", e)))?;
            if !response.status().is_success() {
                return Err(AppError::Upstream(format!("profile: {}", response.status())));
            }
            response
                .json::<Profile>()
                .await
                .map_err(|e| AppError::Upstream(format!("profile: {}", e)))
        }
        .await;

        match result {
            Ok(profile) => profile.display_name,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Display name lookup failed");
                String::new()
            }
        }
    }
}

#[async_trait]
impl MediaFetcher for ChatApiClient {
    async fn fetch_content(&self, message_id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/message/{}/content", self.content_base_url, message_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("content fetch: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "content fetch {}: {}",
                message_id,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Upstream(format!("content fetch: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

/// Delivery webhook posting `{reference, filename, category}` as JSON.
pub struct HttpDeliveryWebhook {
    http: reqwest::Client,
    url: String,
}

impl HttpDeliveryWebhook {
    pub fn new(url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl DeliveryWebhook for HttpDeliveryWebhook {
    async fn notify(&self, reference: &str, filename: &str, category: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.url)
            .json(&serde_json::json!({
                "reference": reference,
                "filename": filename,
                "category": category,
            }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("delivery webhook: {}", e)))?;

        check_response(response).await
    }
}
