//! Webhook signature verification (svix scheme).
//!
//! The provider signs `"{msg_id}.{timestamp}.{body}"` with HMAC-SHA256 using
//! the base64 part of a `whsec_` secret, and sends one or more
//! space-separated `v1,<base64 signature>` entries in `svix-signature`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";
/// Default replay window, matching the provider SDKs
const DEFAULT_TOLERANCE_SECS: i64 = 5 * 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("invalid webhook secret")]
    InvalidSecret,
    #[error("invalid webhook timestamp")]
    InvalidTimestamp,
    #[error("webhook timestamp outside tolerance")]
    TimestampOutOfTolerance,
    #[error("no matching webhook signature")]
    SignatureMismatch,
}

/// Raw values of the `svix-id`, `svix-timestamp` and `svix-signature` headers
#[derive(Debug, Clone, Copy)]
pub struct WebhookHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_secs: i64,
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("key", &"[REDACTED]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl WebhookVerifier {
    /// Accepts the secret with or without the `whsec_` prefix
    pub fn new(secret: &str) -> Result<Self, WebhookError> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| WebhookError::InvalidSecret)?;
        if key.is_empty() {
            return Err(WebhookError::InvalidSecret);
        }

        Ok(Self {
            key,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        })
    }

    pub fn with_tolerance_secs(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Produce the `svix-signature` header value for a payload
    pub fn sign(
        &self,
        msg_id: &str,
        timestamp: i64,
        payload: &[u8],
    ) -> Result<String, WebhookError> {
        let mac = self.mac_for(msg_id, &timestamp.to_string(), payload)?;
        Ok(format!(
            "{},{}",
            SIGNATURE_VERSION,
            STANDARD.encode(mac.finalize().into_bytes())
        ))
    }

    pub fn verify(
        &self,
        headers: &WebhookHeaders<'_>,
        payload: &[u8],
    ) -> Result<(), WebhookError> {
        self.verify_at(headers, payload, Utc::now().timestamp())
    }

    fn verify_at(
        &self,
        headers: &WebhookHeaders<'_>,
        payload: &[u8],
        now: i64,
    ) -> Result<(), WebhookError> {
        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;
        if (now - timestamp).abs() > self.tolerance_secs {
            return Err(WebhookError::TimestampOutOfTolerance);
        }

        let mac = self.mac_for(headers.id, headers.timestamp.trim(), payload)?;

        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
            .any(|sig| mac.clone().verify_slice(&sig).is_ok());

        if matched {
            Ok(())
        } else {
            tracing::debug!(msg_id = %headers.id, "webhook signature mismatch");
            Err(WebhookError::SignatureMismatch)
        }
    }

    fn mac_for(
        &self,
        msg_id: &str,
        timestamp: &str,
        payload: &[u8],
    ) -> Result<HmacSha256, WebhookError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| WebhookError::InvalidSecret)?;
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // base64("jodhpur-darshan-webhook-secret")
    const SECRET: &str = "whsec_am9kaHB1ci1kYXJzaGFuLXdlYmhvb2stc2VjcmV0";
    const BODY: &[u8] = br#"{"type":"user.created","data":{"id":"user_2abc"}}"#;

    fn headers<'a>(id: &'a str, ts: &'a str, sig: &'a str) -> WebhookHeaders<'a> {
        WebhookHeaders {
            id,
            timestamp: ts,
            signature: sig,
        }
    }

    #[test]
    fn test_signed_payload_verifies() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let now = 1_700_000_000;
        let sig = verifier.sign("msg_1", now, BODY).unwrap();

        let ts = now.to_string();
        assert_eq!(
            verifier.verify_at(&headers("msg_1", &ts, &sig), BODY, now + 3),
            Ok(())
        );
    }

    #[test]
    fn test_secret_without_prefix_is_equivalent() {
        let with_prefix = WebhookVerifier::new(SECRET).unwrap();
        let bare = WebhookVerifier::new(SECRET.trim_start_matches("whsec_")).unwrap();
        assert_eq!(
            with_prefix.sign("msg_1", 10, BODY).unwrap(),
            bare.sign("msg_1", 10, BODY).unwrap()
        );
    }

    #[test]
    fn test_any_of_multiple_signatures_may_match() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let now = 1_700_000_000;
        let good = verifier.sign("msg_1", now, BODY).unwrap();
        let header = format!("v1,Zm9vYmFy {}", good);

        let ts = now.to_string();
        assert!(verifier
            .verify_at(&headers("msg_1", &ts, &header), BODY, now)
            .is_ok());
    }

    #[test]
    fn test_modified_body_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let now = 1_700_000_000;
        let sig = verifier.sign("msg_1", now, BODY).unwrap();

        let ts = now.to_string();
        assert_eq!(
            verifier.verify_at(&headers("msg_1", &ts, &sig), b"{}", now),
            Err(WebhookError::SignatureMismatch)
        );
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let then = 1_700_000_000;
        let sig = verifier.sign("msg_1", then, BODY).unwrap();

        let ts = then.to_string();
        assert_eq!(
            verifier.verify_at(&headers("msg_1", &ts, &sig), BODY, then + 3600),
            Err(WebhookError::TimestampOutOfTolerance)
        );
    }

    #[test]
    fn test_bad_inputs() {
        assert_eq!(
            WebhookVerifier::new("whsec_***").unwrap_err(),
            WebhookError::InvalidSecret
        );

        let verifier = WebhookVerifier::new(SECRET).unwrap();
        assert_eq!(
            verifier.verify_at(&headers("msg_1", "yesterday", "v1,abc"), BODY, 0),
            Err(WebhookError::InvalidTimestamp)
        );
    }
}
