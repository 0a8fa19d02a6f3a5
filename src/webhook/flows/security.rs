//! Request signature verification for the WhatsApp Flows endpoint
//!
//! Meta signs every request with HMAC-SHA256 using the app secret and sends the
//! result in the `X-Hub-Signature-256` header as `sha256=<hex_signature>`.
//!
//! # Important Notes
//!
//! - The signature MUST be computed on the raw request body bytes, not parsed JSON
//! - The comparison must be constant-time to prevent timing attacks
//! - Without an app secret the check is skipped, which is only acceptable locally

use crate::consts;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Verifies a request against the configured app secret.
///
/// Returns `true` without checking anything when `app_secret` is absent or
/// empty. A missing header is a failed verification.
pub fn verify_request_signature(
    payload: &[u8],
    signature_header: Option<&str>,
    app_secret: Option<&str>,
) -> bool {
    let Some(app_secret) = app_secret.filter(|secret| !secret.is_empty()) else {
        logfire::warn!(
            "App secret is not set up, request signature validation is skipped. Set APP_SECRET to enable it"
        );
        return true;
    };

    let Some(signature_header) = signature_header else {
        logfire::warn!("Missing {header} header", header = consts::SIGNATURE_HEADER_NAME);
        return false;
    };

    verify_signature(signature_header, payload, app_secret)
}

/// Verifies the X-Hub-Signature-256 header against the request payload
///
/// # Arguments
///
/// * `signature_header` - The value of the X-Hub-Signature-256 header (e.g., "sha256=abc123...")
/// * `payload` - The raw request body bytes
/// * `app_secret` - The Meta app secret
///
/// # Returns
///
/// * `true` if the signature is valid
/// * `false` if the signature is invalid or the header format is incorrect
pub fn verify_signature(signature_header: &str, payload: &[u8], app_secret: &str) -> bool {
    let signature_hex = match signature_header.strip_prefix(consts::SIGNATURE_HEADER_PREFIX) {
        Some(sig) => sig,
        None => {
            logfire::warn!("Invalid signature header format: expected 'sha256=' prefix");
            return false;
        }
    };

    let expected_signature = match hex::decode(signature_hex) {
        Ok(sig) => sig,
        Err(e) => {
            logfire::warn!(
                "Failed to decode signature hex: {error}",
                error = e.to_string()
            );
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(app_secret.as_bytes()) {
        Ok(m) => m,
        Err(e) => {
            logfire::error!(
                "Failed to create HMAC instance: {error}",
                error = e.to_string()
            );
            return false;
        }
    };

    mac.update(payload);
    let computed_signature = mac.finalize().into_bytes();

    // ct_eq is false for slices of different length
    let is_valid: bool = computed_signature.ct_eq(&expected_signature[..]).into();

    if !is_valid {
        logfire::error!("Request signature did not match");
    }

    is_valid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_verify_signature_valid() {
        let payload = b"{\"encrypted_flow_data\":\"abc\"}";
        let secret = "test_secret";

        assert!(verify_signature(&sign(payload, secret), payload, secret));
    }

    #[test]
    fn test_verify_signature_invalid() {
        let payload = b"{\"test\":\"data\"}";
        let wrong_signature =
            "sha256=0000000000000000000000000000000000000000000000000000000000000000";

        assert!(!verify_signature(wrong_signature, payload, "test_secret"));
    }

    #[test]
    fn test_verify_signature_wrong_secret() {
        let payload = b"{\"test\":\"data\"}";

        assert!(!verify_signature(
            &sign(payload, "wrong_secret"),
            payload,
            "test_secret"
        ));
    }

    #[test]
    fn test_verify_signature_invalid_header_format() {
        let payload = b"{\"test\":\"data\"}";
        let secret = "test_secret";

        assert!(!verify_signature("abc123", payload, secret));
        assert!(!verify_signature("sha1=abc123", payload, secret));
        assert!(!verify_signature("sha256=zzzzz", payload, secret));
        assert!(!verify_signature("sha256=", payload, secret));
    }

    #[test]
    fn test_single_bit_flip_in_signature_fails() {
        let payload = b"{\"test\":\"data\"}";
        let secret = "test_secret";
        let header = sign(payload, secret);
        let mut digest = hex::decode(header.trim_start_matches("sha256=")).unwrap();

        for byte in 0..digest.len() {
            digest[byte] ^= 0x01;
            let mutated = format!("sha256={}", hex::encode(&digest));
            assert!(!verify_signature(&mutated, payload, secret));
            digest[byte] ^= 0x01;
        }
    }

    #[test]
    fn test_single_bit_flip_in_payload_fails() {
        let payload = b"{\"test\":\"data\"}".to_vec();
        let secret = "test_secret";
        let header = sign(&payload, secret);

        for byte in 0..payload.len() {
            let mut tampered = payload.clone();
            tampered[byte] ^= 0x80;
            assert!(!verify_signature(&header, &tampered, secret));
        }
    }

    #[test]
    fn test_request_signature_skipped_without_secret() {
        let payload = b"{}";

        assert!(verify_request_signature(payload, None, None));
        assert!(verify_request_signature(payload, Some("sha256=00"), Some("")));
    }

    #[test]
    fn test_request_signature_missing_header_fails() {
        assert!(!verify_request_signature(b"{}", None, Some("test_secret")));
    }

    #[test]
    fn test_request_signature_valid_header() {
        let payload = b"{}";
        let header = sign(payload, "test_secret");

        assert!(verify_request_signature(
            payload,
            Some(&header),
            Some("test_secret")
        ));
    }
}
