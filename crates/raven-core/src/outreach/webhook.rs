//! Signed webhook delivery for outreach text.
//!
//! The body is JSON `{"text", "sent_at"}`; when a secret is configured it is
//! signed with HMAC-SHA256 and sent as `X-Raven-Signature: sha256=<hex>`.
//! Single attempt: a failed delivery waits for the next scheduled run.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::json;
use sha2::Sha256;

use crate::error::{ErrorCode, RavenError, RavenResult};
use crate::traits::Outbox;

pub const SIGNATURE_HEADER: &str = "X-Raven-Signature";
const DELIVERY_HEADER: &str = "X-Raven-Delivery";

/// [`Outbox`] that POSTs to the destination URL.
#[derive(Clone)]
pub struct WebhookOutbox {
    client: Client,
    secret: Option<String>,
}

impl WebhookOutbox {
    pub fn new(secret: Option<String>, timeout: Duration) -> RavenResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RavenError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, secret })
    }

    /// `sha256=<hex>` for `payload`, or `None` without a secret.
    fn sign_payload(&self, payload: &str) -> RavenResult<Option<String>> {
        self.secret
            .as_deref()
            .map(|secret| sign(payload, secret))
            .transpose()
    }
}

fn sign(payload: &str, secret: &str) -> RavenResult<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| RavenError::internal(format!("Invalid HMAC key: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

/// Check a received signature against `payload` and `secret`.
pub fn verify_signature(payload: &str, secret: &str, signature: &str) -> bool {
    match sign(payload, secret) {
        Ok(expected) => constant_time_eq(expected.as_bytes(), signature.as_bytes()),
        Err(_) => false,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[async_trait]
impl Outbox for WebhookOutbox {
    async fn deliver(&self, destination: &str, text: &str) -> RavenResult<()> {
        let payload = json!({
            "text": text,
            "sent_at": Utc::now().to_rfc3339(),
        })
        .to_string();

        let mut request = self
            .client
            .post(destination)
            .header("Content-Type", "application/json")
            .header(DELIVERY_HEADER, uuid::Uuid::new_v4().to_string());
        if let Some(signature) = self.sign_payload(&payload)? {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request
            .body(payload)
            .send()
            .await
            .map_err(|e| RavenError::Delivery {
                message: format!("Webhook {} unreachable: {}", destination, e),
                code: ErrorCode::DlvTransient,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let code = if status.is_server_error() {
            ErrorCode::DlvTransient
        } else {
            ErrorCode::DlvRejected
        };
        Err(RavenError::Delivery {
            message: format!("Webhook {} answered {}: {}", destination, status, body),
            code,
            source: None,
        })
    }
}
