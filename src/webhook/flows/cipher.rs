//! AES-GCM handling of the flow payloads
//!
//! Both directions use the AES key recovered from the request. The response
//! is encrypted under the bitwise inverse of the request IV so the same
//! (key, IV) pair is never used twice.

use super::{
    errors::FlowError,
    schemas::{DecryptedMessage, ReplyPayload},
};
use crate::consts::GCM_TAG_LEN;
use base64::{Engine, prelude::BASE64_STANDARD};
use openssl::symm::{Cipher, decrypt_aead, encrypt_aead};
use zeroize::Zeroizing;

fn aes_gcm_cipher(key: &[u8]) -> Option<Cipher> {
    match key.len() {
        16 => Some(Cipher::aes_128_gcm()),
        24 => Some(Cipher::aes_192_gcm()),
        32 => Some(Cipher::aes_256_gcm()),
        _ => None,
    }
}

/// Inverts every bit of the IV, applying it twice gives back the input
pub fn flip_iv(iv: &[u8]) -> Vec<u8> {
    iv.iter().map(|byte| !byte).collect()
}

/// Decrypts `encrypted_flow_data` into the JSON object sent by WhatsApp
pub fn decrypt_payload(
    encrypted_data: &str,
    key: &[u8],
    iv: &[u8],
) -> Result<DecryptedMessage, FlowError> {
    let blob = BASE64_STANDARD
        .decode(encrypted_data.as_bytes())
        .map_err(|e| FlowError::SymmetricDecryptFailure(format!("encrypted_flow_data: {e}")))?;

    if blob.len() < GCM_TAG_LEN {
        return Err(FlowError::SymmetricDecryptFailure(format!(
            "ciphertext is {} bytes, shorter than the authentication tag",
            blob.len()
        )));
    }
    let (ciphertext, tag) = blob.split_at(blob.len() - GCM_TAG_LEN);

    let cipher = aes_gcm_cipher(key).ok_or_else(|| {
        FlowError::SymmetricDecryptFailure(format!("unsupported key length {}", key.len()))
    })?;
    if iv.is_empty() {
        return Err(FlowError::SymmetricDecryptFailure(
            "empty initial vector".to_string(),
        ));
    }

    let plaintext = Zeroizing::new(
        decrypt_aead(cipher, key, Some(iv), &[], ciphertext, tag)
            .map_err(|e| FlowError::SymmetricDecryptFailure(e.to_string()))?,
    );

    serde_json::from_slice::<DecryptedMessage>(&plaintext)
        .map_err(|e| FlowError::PayloadParseFailure(e.to_string()))
}

/// Encrypts the reply for WhatsApp, returns `base64(ciphertext || tag)`.
///
/// `iv` is the request IV, the flipped value is derived here.
pub fn encrypt_response(
    reply: &ReplyPayload,
    key: &[u8],
    iv: &[u8],
) -> Result<String, FlowError> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(reply).map_err(|e| FlowError::EncryptFailure(e.to_string()))?,
    );

    let cipher = aes_gcm_cipher(key)
        .ok_or_else(|| FlowError::EncryptFailure(format!("unsupported key length {}", key.len())))?;
    if iv.is_empty() {
        return Err(FlowError::EncryptFailure("empty initial vector".to_string()));
    }

    let response_iv = flip_iv(iv);
    let mut tag = [0u8; GCM_TAG_LEN];
    let mut blob = encrypt_aead(
        cipher,
        key,
        Some(response_iv.as_slice()),
        &[],
        &plaintext,
        &mut tag,
    )
    .map_err(|e| FlowError::EncryptFailure(e.to_string()))?;
    blob.extend_from_slice(&tag);

    Ok(BASE64_STANDARD.encode(blob))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::flows::test_utils;
    use serde_json::json;

    const KEY: [u8; 16] = [0x11; 16];
    const IV: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0xff,
    ];

    #[test]
    fn test_flip_iv_inverts_every_bit() {
        let flipped = flip_iv(&IV);

        assert_eq!(flipped[0], 0xff);
        assert_eq!(flipped[15], 0x00);
        assert!(flipped.iter().zip(IV.iter()).all(|(a, b)| a ^ b == 0xff));
        assert_ne!(flipped.as_slice(), &IV);
    }

    #[test]
    fn test_flip_iv_is_an_involution() {
        for iv in [vec![], vec![0u8], vec![0xAA; 12], IV.to_vec(), (0..=255).collect()] {
            assert_eq!(flip_iv(&flip_iv(&iv)), iv);
        }
    }

    #[test]
    fn test_decrypt_payload() {
        let data = test_utils::encrypt_flow_data(br#"{"flow_token":"abc"}"#, &KEY, &IV);

        let message = decrypt_payload(&data, &KEY, &IV).unwrap();

        assert_eq!(message.get("flow_token"), Some(&json!("abc")));
    }

    #[test]
    fn test_response_round_trips_across_flipped_iv() {
        for key in [vec![1u8; 16], vec![2u8; 24], vec![3u8; 32]] {
            let reply = json!({"screen": "SUCCESS", "data": {"count": 3}});

            let encrypted = encrypt_response(&reply, &key, &IV).unwrap();
            let decrypted = decrypt_payload(&encrypted, &key, &flip_iv(&IV)).unwrap();

            assert_eq!(serde_json::Value::Object(decrypted), reply);
        }
    }

    #[test]
    fn test_response_cannot_be_read_with_request_iv() {
        let encrypted = encrypt_response(&json!({"screen": "SUCCESS"}), &KEY, &IV).unwrap();

        assert!(matches!(
            decrypt_payload(&encrypted, &KEY, &IV),
            Err(FlowError::SymmetricDecryptFailure(_))
        ));
    }

    #[test]
    fn test_tampered_tag_fails() {
        let data = test_utils::encrypt_flow_data(br#"{"flow_token":"abc"}"#, &KEY, &IV);
        let mut blob = BASE64_STANDARD.decode(&data).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;

        let result = decrypt_payload(&BASE64_STANDARD.encode(&blob), &KEY, &IV);

        assert!(matches!(
            result,
            Err(FlowError::SymmetricDecryptFailure(_))
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let data = test_utils::encrypt_flow_data(br#"{"flow_token":"abc"}"#, &KEY, &IV);
        let mut blob = BASE64_STANDARD.decode(&data).unwrap();
        blob[0] ^= 0x01;

        let result = decrypt_payload(&BASE64_STANDARD.encode(&blob), &KEY, &IV);

        assert!(matches!(
            result,
            Err(FlowError::SymmetricDecryptFailure(_))
        ));
    }

    #[test]
    fn test_truncated_input_fails() {
        let short = BASE64_STANDARD.encode([0u8; GCM_TAG_LEN - 1]);

        assert!(matches!(
            decrypt_payload(&short, &KEY, &IV),
            Err(FlowError::SymmetricDecryptFailure(_))
        ));
        assert!(matches!(
            decrypt_payload("not base64!", &KEY, &IV),
            Err(FlowError::SymmetricDecryptFailure(_))
        ));
    }

    #[test]
    fn test_plaintext_that_is_not_a_json_object() {
        for plaintext in [&b"not json"[..], &b"[1,2,3]"[..]] {
            let data = test_utils::encrypt_flow_data(plaintext, &KEY, &IV);

            assert!(matches!(
                decrypt_payload(&data, &KEY, &IV),
                Err(FlowError::PayloadParseFailure(_))
            ));
        }
    }

    #[test]
    fn test_unsupported_key_length() {
        assert!(matches!(
            encrypt_response(&json!({}), &[0u8; 10], &IV),
            Err(FlowError::EncryptFailure(_))
        ));
        assert!(matches!(
            encrypt_response(&json!({}), &KEY, &[]),
            Err(FlowError::EncryptFailure(_))
        ));
    }
}
