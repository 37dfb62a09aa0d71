//! Webhook signature verification (svix scheme).
//!
//! Clerk delivers webhooks through svix. The signed content is
//! `"{svix-id}.{svix-timestamp}.{body}"`, the key is the base64-decoded
//! secret after the `whsec_` prefix, and the `svix-signature` header
//! carries one or more space-separated `v1,<base64>` entries.

use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::crypto::{constant_time_eq, hmac_sha256_base64};

/// Webhook verification error.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// A required svix header is missing or not valid UTF-8.
    #[error("missing webhook header: {0}")]
    MissingHeader(&'static str),

    /// The signing secret is malformed.
    #[error("malformed webhook secret")]
    MalformedSecret,

    /// No signature entry matched.
    #[error("invalid webhook signature")]
    InvalidSignature,
}

/// Verify a svix-signed webhook request against the signing secret.
///
/// # Errors
///
/// Returns a `WebhookError` if headers are missing, the secret cannot be
/// decoded, or no signature matches.
pub fn verify_webhook(headers: &HeaderMap, body: &str, secret: &str) -> Result<(), WebhookError> {
    let msg_id = header_str(headers, "svix-id")?;
    let timestamp = header_str(headers, "svix-timestamp")?;
    let signature_header = header_str(headers, "svix-signature")?;

    let key = decode_secret(secret)?;
    let signed_content = format!("{msg_id}.{timestamp}.{body}");
    let expected = hmac_sha256_base64(&key, signed_content.as_bytes());

    // Header format: "v1,<base64> v1,<base64> ..." (any match accepts)
    let valid = signature_header
        .split(' ')
        .filter_map(|entry| entry.split_once(','))
        .filter(|(version, _)| *version == "v1")
        .any(|(_, sig)| constant_time_eq(&expected, sig));

    if valid {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingHeader(name))
}

fn decode_secret(secret: &str) -> Result<Vec<u8>, WebhookError> {
    let encoded = secret.strip_prefix("whsec_").unwrap_or(secret);
    BASE64
        .decode(encoded)
        .map_err(|_| WebhookError::MalformedSecret)
}
