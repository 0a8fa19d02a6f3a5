//! Data structures exchanged with the WhatsApp Flows endpoint

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Plaintext request sent by WhatsApp once the envelope is opened
pub type DecryptedMessage = serde_json::Map<String, serde_json::Value>;

/// Reply computed by the flow logic, encrypted before leaving the endpoint
pub type ReplyPayload = serde_json::Value;

/// Encrypted body of every POST request
#[derive(Debug, Clone, Deserialize)]
pub struct EncryptedEnvelope {
    /// AES key encrypted with our RSA public key (base64)
    pub encrypted_aes_key: String,
    /// `ciphertext || tag` of the flow request (base64)
    pub encrypted_flow_data: String,
    /// AES-GCM initialization vector, not encrypted (base64)
    pub initial_vector: String,
}

/// AES key and IV recovered from an [`EncryptedEnvelope`].
///
/// Lives for a single request/response pair, the bytes are wiped on drop.
pub struct SymmetricMaterial {
    pub key: Zeroizing<Vec<u8>>,
    pub iv: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for SymmetricMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricMaterial")
            .field("key_len", &self.key.len())
            .field("iv_len", &self.iv.len())
            .finish()
    }
}

/// Query parameters of the liveness check
#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    pub challenge: Option<String>,
}

/// Signed answer to a liveness challenge
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub status: &'static str,
    pub challenge: String,
    /// base64 RSA PKCS#1 v1.5 / SHA-256 signature of `challenge`
    pub signature: String,
}

/// Answer to a plain `GET /`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}
