//! Signature verification for incoming webhook requests
//!
//! Senders sign every delivery with HMAC-SHA256 using a secret shared with us.
//! Two header layouts are supported:
//!
//! - `sha256=<hex>` (`X-Hub-Signature-256`, GitHub style): HMAC of the raw body.
//! - `t=<unix>,v1=<hex>[,v1=<hex>...]` (`Stripe-Signature`): HMAC of
//!   `"<t>.<raw body>"`, only valid while `t` is within a tolerance window.
//!
//! # Important Notes
//!
//! - The signature MUST be computed on the raw request body bytes, not parsed JSON
//! - The comparison is constant-time to prevent timing attacks
//! - Verification never fails loudly: a malformed header is just a rejected signature

use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq};

use crate::consts;

type HmacSha256 = Hmac<Sha256>;

/// How a provider signs its deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// `sha256=<hex>` over the raw body
    HubSha256,
    /// `t=<unix>,v1=<hex>` over `"<t>.<raw body>"`
    Stripe { tolerance: TimeDelta },
}

impl SignatureScheme {
    pub fn verify(
        &self,
        signature_header: &str,
        payload: &[u8],
        secret: &str,
        now: DateTime<Utc>,
    ) -> bool {
        match self {
            SignatureScheme::HubSha256 => verify_signature(signature_header, payload, secret),
            SignatureScheme::Stripe { tolerance } => {
                verify_stripe_signature(signature_header, payload, secret, now, *tolerance)
            }
        }
    }
}

fn hmac_sha256(secret: &str, chunks: &[&[u8]]) -> Option<Vec<u8>> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(e) => {
            logfire::error!(
                "Failed to create HMAC instance: {error}",
                error = e.to_string()
            );
            return None;
        }
    };

    for chunk in chunks {
        mac.update(chunk);
    }

    Some(mac.finalize().into_bytes().to_vec())
}

/// Constant-time comparison of the computed digest against a hex signature.
fn digest_matches(computed: &[u8], signature_hex: &str) -> Choice {
    match hex::decode(signature_hex) {
        Ok(expected) => computed.ct_eq(&expected[..]),
        Err(_) => Choice::from(0),
    }
}

/// Builds the `sha256=<hex>` header value for a payload.
pub fn sign_payload(payload: &[u8], secret: &str) -> anyhow::Result<String> {
    let digest = hmac_sha256(secret, &[payload])
        .ok_or_else(|| anyhow::anyhow!("failed to create HMAC instance"))?;

    Ok(format!("{}{}", consts::HUB_SIGNATURE_PREFIX, hex::encode(digest)))
}

/// Builds the `t=<unix>,v1=<hex>` header value for a payload.
pub fn sign_stripe_payload(
    payload: &[u8],
    secret: &str,
    timestamp: DateTime<Utc>,
) -> anyhow::Result<String> {
    let t = timestamp.timestamp().to_string();
    let digest = hmac_sha256(secret, &[t.as_bytes(), b".", payload])
        .ok_or_else(|| anyhow::anyhow!("failed to create HMAC instance"))?;

    Ok(format!("t={t},v1={}", hex::encode(digest)))
}

/// Verifies a `sha256=<hex>` signature header against the request payload
///
/// # Arguments
///
/// * `signature_header` - The header value (e.g., "sha256=abc123...")
/// * `payload` - The raw request body bytes
/// * `secret` - The shared webhook secret
///
/// # Returns
///
/// * `true` if the signature is valid
/// * `false` if the signature is invalid or the header format is incorrect
pub fn verify_signature(signature_header: &str, payload: &[u8], secret: &str) -> bool {
    let signature_hex = match signature_header.strip_prefix(consts::HUB_SIGNATURE_PREFIX) {
        Some(sig) => sig,
        None => {
            logfire::warn!("Invalid signature header format: expected 'sha256=' prefix");
            return false;
        }
    };

    let Some(computed_signature) = hmac_sha256(secret, &[payload]) else {
        return false;
    };

    let is_valid: bool = digest_matches(&computed_signature, signature_hex).into();

    if !is_valid {
        logfire::warn!("Webhook signature verification failed: signatures do not match");
    }

    is_valid
}

/// Verifies a Stripe `t=<unix>,v1=<hex>` signature header.
///
/// Every `v1` entry is compared (Stripe sends several while a secret is being
/// rolled); one match is enough. The timestamp must be within `tolerance` of `now`
/// in either direction.
pub fn verify_stripe_signature(
    signature_header: &str,
    payload: &[u8],
    secret: &str,
    now: DateTime<Utc>,
    tolerance: TimeDelta,
) -> bool {
    let mut timestamp: Option<&str> = None;
    let mut signatures = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let Some(t) = timestamp else {
        logfire::warn!("Invalid Stripe signature header: missing timestamp");
        return false;
    };

    let Ok(signed_at) = t.parse::<i64>() else {
        logfire::warn!("Invalid Stripe signature header: timestamp is not a number");
        return false;
    };

    if signatures.is_empty() {
        logfire::warn!("Invalid Stripe signature header: no v1 signature");
        return false;
    }

    if now.timestamp().abs_diff(signed_at) > tolerance.num_seconds().unsigned_abs() {
        logfire::warn!(
            "Stripe signature timestamp outside tolerance: {signed_at}",
            signed_at = signed_at.to_string()
        );
        return false;
    }

    let Some(computed_signature) = hmac_sha256(secret, &[t.as_bytes(), b".", payload]) else {
        return false;
    };

    let is_valid: bool = signatures
        .iter()
        .fold(Choice::from(0), |acc, signature| {
            acc | digest_matches(&computed_signature, signature)
        })
        .into();

    if !is_valid {
        logfire::warn!("Stripe signature verification failed: signatures do not match");
    }

    is_valid
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = b"{\"id\":\"evt_1\",\"type\":\"checkout.session.completed\"}";
    const SECRET: &str = "whsec_test";

    fn flip_last_hex_char(header: &str) -> String {
        let mut chars: Vec<char> = header.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '0' { '1' } else { '0' };
        chars.into_iter().collect()
    }

    #[test]
    fn test_verify_signature_valid() {
        let header = sign_payload(PAYLOAD, SECRET).unwrap();

        assert!(header.starts_with("sha256="));
        assert!(verify_signature(&header, PAYLOAD, SECRET));
    }

    #[test]
    fn test_verify_signature_invalid() {
        let wrong_signature =
            "sha256=0000000000000000000000000000000000000000000000000000000000000000";

        assert!(!verify_signature(wrong_signature, PAYLOAD, SECRET));
    }

    #[test]
    fn test_verify_signature_wrong_secret() {
        let header = sign_payload(PAYLOAD, "another_secret").unwrap();

        assert!(!verify_signature(&header, PAYLOAD, SECRET));
    }

    #[test]
    fn test_verify_signature_one_hex_char_altered() {
        let header = flip_last_hex_char(&sign_payload(PAYLOAD, SECRET).unwrap());

        assert!(!verify_signature(&header, PAYLOAD, SECRET));
    }

    #[test]
    fn test_verify_signature_invalid_header_format() {
        assert!(!verify_signature("abc123", PAYLOAD, SECRET));
        assert!(!verify_signature("sha1=abc123", PAYLOAD, SECRET));
        assert!(!verify_signature("", PAYLOAD, SECRET));
    }

    #[test]
    fn test_verify_signature_invalid_hex() {
        assert!(!verify_signature("sha256=zzzzz", PAYLOAD, SECRET));
    }

    #[test]
    fn test_verify_signature_truncated_digest() {
        let header = sign_payload(PAYLOAD, SECRET).unwrap();

        assert!(!verify_signature(&header[..header.len() - 2], PAYLOAD, SECRET));
    }

    #[test]
    fn test_verify_signature_tampered_payload() {
        let header = sign_payload(PAYLOAD, SECRET).unwrap();

        assert!(!verify_signature(&header, b"{\"id\":\"evt_2\"}", SECRET));
    }

    #[test]
    fn test_verify_signature_is_byte_exact() {
        let header = sign_payload(PAYLOAD, SECRET).unwrap();
        let reserialized = serde_json::to_vec_pretty(
            &serde_json::from_slice::<serde_json::Value>(PAYLOAD).unwrap(),
        )
        .unwrap();

        assert!(!verify_signature(&header, &reserialized, SECRET));
    }

    #[test]
    fn test_verify_stripe_signature_valid() {
        let now = Utc::now();
        let header = sign_stripe_payload(PAYLOAD, SECRET, now).unwrap();

        assert!(verify_stripe_signature(
            &header,
            PAYLOAD,
            SECRET,
            now,
            TimeDelta::seconds(300)
        ));
    }

    #[test]
    fn test_verify_stripe_signature_accepts_any_matching_v1() {
        let now = Utc::now();
        let valid = sign_stripe_payload(PAYLOAD, SECRET, now).unwrap();
        let v1 = valid.split_once(",v1=").unwrap().1;
        let header = format!(
            "t={},v1={},v1={v1}",
            now.timestamp(),
            "0".repeat(64)
        );

        assert!(verify_stripe_signature(
            &header,
            PAYLOAD,
            SECRET,
            now,
            TimeDelta::seconds(300)
        ));
    }

    #[test]
    fn test_verify_stripe_signature_outside_tolerance() {
        let signed_at = Utc::now();
        let header = sign_stripe_payload(PAYLOAD, SECRET, signed_at).unwrap();

        assert!(!verify_stripe_signature(
            &header,
            PAYLOAD,
            SECRET,
            signed_at + TimeDelta::seconds(301),
            TimeDelta::seconds(300)
        ));
        assert!(!verify_stripe_signature(
            &header,
            PAYLOAD,
            SECRET,
            signed_at - TimeDelta::seconds(301),
            TimeDelta::seconds(300)
        ));
    }

    #[test]
    fn test_verify_stripe_signature_malformed() {
        let now = Utc::now();
        let tolerance = TimeDelta::seconds(300);

        assert!(!verify_stripe_signature("", PAYLOAD, SECRET, now, tolerance));
        assert!(!verify_stripe_signature("v1=abcd", PAYLOAD, SECRET, now, tolerance));
        assert!(!verify_stripe_signature(
            &format!("t={}", now.timestamp()),
            PAYLOAD,
            SECRET,
            now,
            tolerance
        ));
        assert!(!verify_stripe_signature("t=soon,v1=abcd", PAYLOAD, SECRET, now, tolerance));
    }

    #[test]
    fn test_verify_stripe_signature_extreme_timestamps() {
        let now = Utc::now();
        let tolerance = TimeDelta::seconds(300);
        let v1 = "0".repeat(64);

        for t in [i64::MIN, i64::MAX] {
            let header = format!("t={t},v1={v1}");
            assert!(!verify_stripe_signature(&header, PAYLOAD, SECRET, now, tolerance));
        }
    }

    #[test]
    fn test_verify_stripe_signature_wrong_secret() {
        let now = Utc::now();
        let header = sign_stripe_payload(PAYLOAD, "whsec_other", now).unwrap();

        assert!(!verify_stripe_signature(
            &header,
            PAYLOAD,
            SECRET,
            now,
            TimeDelta::seconds(300)
        ));
    }

    #[test]
    fn test_scheme_dispatches_to_matching_verifier() {
        let now = Utc::now();
        let hub_header = sign_payload(PAYLOAD, SECRET).unwrap();
        let stripe_header = sign_stripe_payload(PAYLOAD, SECRET, now).unwrap();
        let stripe = SignatureScheme::Stripe {
            tolerance: TimeDelta::seconds(300),
        };

        assert!(SignatureScheme::HubSha256.verify(&hub_header, PAYLOAD, SECRET, now));
        assert!(!SignatureScheme::HubSha256.verify(&stripe_header, PAYLOAD, SECRET, now));
        assert!(stripe.verify(&stripe_header, PAYLOAD, SECRET, now));
        assert!(!stripe.verify(&hub_header, PAYLOAD, SECRET, now));
    }
}
