//! # WhatsApp Flows Exchange Handler
//!
//! Runs one encrypted exchange: signature check, key unwrap, payload
//! decryption, flow logic and response encryption. Knows nothing about HTTP,
//! the routes map [`FlowError`] and [`ExchangeReply`] to status codes.

use super::{
    cipher,
    errors::FlowError,
    keys::{self, PrivateKeyMaterial},
    logic::{FlowLogic, FlowLogicError},
    schemas::EncryptedEnvelope,
    security,
};
use serde_json::json;
use std::sync::Arc;

/// Immutable settings shared by every request
#[derive(Clone, Default)]
pub struct EndpointSettings {
    /// Decrypt paths answer 500 when missing
    pub private_key: Option<PrivateKeyMaterial>,
    /// 🔒 SENSITIVE: signature checks are skipped when missing
    pub app_secret: Option<String>,
}

/// Successful outcome of an exchange, both variants carry the base64 ciphertext
#[derive(Debug, PartialEq)]
pub enum ExchangeReply {
    Screen(String),
    /// Encrypted `{"error_msg": ...}` to be sent with status 427
    TokenInvalidated(String),
}

#[derive(Clone)]
pub struct FlowEndpoint {
    settings: Arc<EndpointSettings>,
    logic: Arc<dyn FlowLogic>,
}

impl FlowEndpoint {
    pub fn new(settings: EndpointSettings, logic: Arc<dyn FlowLogic>) -> Self {
        Self {
            settings: Arc::new(settings),
            logic,
        }
    }

    /// Processes a raw POST body and its `x-hub-signature-256` header
    pub async fn exchange(
        &self,
        body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<ExchangeReply, FlowError> {
        let private_key = self.settings.private_key.as_ref().ok_or_else(|| {
            FlowError::ConfigurationMissing(
                "private key is empty, check the PRIVATE_KEY env variable".to_string(),
            )
        })?;

        if !security::verify_request_signature(
            body,
            signature_header,
            self.settings.app_secret.as_deref(),
        ) {
            return Err(FlowError::SignatureMismatch);
        }

        if body.is_empty() {
            return Err(FlowError::MalformedEnvelope("empty request body".to_string()));
        }
        let envelope: EncryptedEnvelope = serde_json::from_slice(body)
            .map_err(|e| FlowError::MalformedEnvelope(e.to_string()))?;

        let material = keys::unwrap_symmetric_material(&envelope, private_key)?;
        let message =
            cipher::decrypt_payload(&envelope.encrypted_flow_data, &material.key, &material.iv)?;

        logfire::info!(
            "Decrypted flow request: action={action}",
            action = message
                .get("action")
                .and_then(|action| action.as_str())
                .unwrap_or("unknown")
                .to_string()
        );

        match self.logic.next_screen(&message).await {
            Ok(reply) => Ok(ExchangeReply::Screen(cipher::encrypt_response(
                &reply,
                &material.key,
                &material.iv,
            )?)),
            Err(FlowLogicError::FlowTokenInvalidated { error_msg }) => {
                logfire::warn!(
                    "Flow token invalidated: {error_msg}",
                    error_msg = error_msg.clone()
                );
                let reply = json!({ "error_msg": error_msg });
                Ok(ExchangeReply::TokenInvalidated(cipher::encrypt_response(
                    &reply,
                    &material.key,
                    &material.iv,
                )?))
            }
            Err(FlowLogicError::Internal(msg)) => Err(FlowError::BusinessLogicFailure(msg)),
        }
    }

    /// Signs a liveness challenge with the endpoint private key
    pub fn sign_challenge(&self, challenge: &str) -> Result<String, FlowError> {
        keys::sign_challenge(challenge, self.settings.private_key.as_ref())
    }
}
