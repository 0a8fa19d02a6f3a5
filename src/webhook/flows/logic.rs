//! # Flow Logic
//!
//! Business logic plugged into the endpoint. It only ever sees decrypted
//! messages and returns plain JSON; encryption stays in the handler.

use super::schemas::{DecryptedMessage, ReplyPayload};
use async_trait::async_trait;
use derive_more::{Display, Error};
use serde_json::json;

#[derive(Debug, Display, Error, PartialEq)]
pub enum FlowLogicError {
    /// The flow token can no longer be used, WhatsApp shows `error_msg` and
    /// disables the flow
    #[display("flow token invalidated: {error_msg}")]
    FlowTokenInvalidated {
        #[error(not(source))]
        error_msg: String,
    },
    Internal(#[error(not(source))] String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FlowLogic: Send + Sync {
    /// Computes the reply to a decrypted flow request
    async fn next_screen(&self, message: &DecryptedMessage)
    -> Result<ReplyPayload, FlowLogicError>;
}

/// Logic used when no flow is wired in: answers health checks and error
/// notifications, echoes everything else.
#[derive(Clone, Default)]
pub struct DefaultFlowLogic;

#[async_trait]
impl FlowLogic for DefaultFlowLogic {
    async fn next_screen(
        &self,
        message: &DecryptedMessage,
    ) -> Result<ReplyPayload, FlowLogicError> {
        if message.get("action").and_then(|action| action.as_str()) == Some("ping") {
            return Ok(json!({"data": {"status": "active"}}));
        }

        let client_error = message
            .get("data")
            .and_then(|data| data.as_object())
            .and_then(|data| data.get("error"));
        if let Some(client_error) = client_error {
            logfire::warn!(
                "Received client error notification: {error}",
                error = client_error.to_string()
            );
            return Ok(json!({"data": {"acknowledged": true}}));
        }

        Ok(json!({"status": "ok", "received": message}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(value: serde_json::Value) -> DecryptedMessage {
        value.as_object().cloned().unwrap()
    }

    #[ntex::test]
    async fn test_ping_is_answered_as_active() {
        let reply = DefaultFlowLogic
            .next_screen(&message(json!({"version": "3.0", "action": "ping"})))
            .await;

        assert_eq!(reply, Ok(json!({"data": {"status": "active"}})));
    }

    #[ntex::test]
    async fn test_client_error_is_acknowledged() {
        let reply = DefaultFlowLogic
            .next_screen(&message(json!({
                "action": "data_exchange",
                "flow_token": "abc",
                "data": {"error": "INVALID_SCREEN", "error_message": "bad"}
            })))
            .await;

        assert_eq!(reply, Ok(json!({"data": {"acknowledged": true}})));
    }

    #[ntex::test]
    async fn test_other_messages_are_echoed() {
        let request = json!({"action": "INIT", "flow_token": "abc"});
        let reply = DefaultFlowLogic.next_screen(&message(request.clone())).await;

        assert_eq!(reply, Ok(json!({"status": "ok", "received": request})));
    }
}
