// SPDX-License-Identifier: MIT

//! Webhook signature verification.
//!
//! The chat platform signs each webhook delivery with
//! base64(HMAC-SHA256(channel secret, raw body)) in the
//! `x-line-signature` header. The check runs over the raw bytes before
//! JSON parsing, so the body is buffered here and restored for the
//! handler.

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Signature header set by the chat platform.
const SIGNATURE_HEADER: &str = "x-line-signature";

/// Webhook bodies larger than this are rejected outright.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Reject webhook deliveries whose signature does not match.
pub async fn verify_signature(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();

    let signature = match parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(s) => s.to_string(),
        None => {
            tracing::warn!("Webhook rejected: missing signature header");
            return StatusCode::FORBIDDEN.into_response();
        }
    };

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(_) => {
            tracing::warn!("Webhook rejected: unreadable or oversized body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if !signature_matches(&state.config.channel_secret, &bytes, &signature) {
        tracing::warn!("Webhook rejected: signature mismatch");
        return StatusCode::FORBIDDEN.into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Constant-time comparison of the claimed signature against our own MAC.
fn signature_matches(secret: &str, body: &[u8], claimed_base64: &str) -> bool {
    let claimed = match base64::engine::general_purpose::STANDARD.decode(claimed_base64) {
        Ok(c) => c,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&claimed).is_ok()
}

/// Compute the signature a platform would send (used by tests).
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key size");
    mac.update(body);
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_signature_matches() {
        let secret = "channel-secret";
        let body = br#"{"events":[]}"#;
        let signature = sign(secret, body);

        assert!(signature_matches(secret, body, &signature));
    }

    #[test]
    fn tampered_body_fails() {
        let secret = "channel-secret";
        let signature = sign(secret, br#"{"events":[]}"#);

        assert!(!signature_matches(secret, br#"{"events":[{}]}"#, &signature));
    }

    #[test]
    fn wrong_secret_fails() {
        let body = br#"{"events":[]}"#;
        let signature = sign("other-secret", body);

        assert!(!signature_matches("channel-secret", body, &signature));
    }

    #[test]
    fn garbage_base64_fails() {
        assert!(!signature_matches("secret", b"body", "not-base64!!!"));
    }
}
