use crate::consts;
use derive_more::{Display, Error};
use ntex::{http, web};

/// Every way an exchange with WhatsApp Flows can fail.
///
/// The status code of each kind is part of the contract with WhatsApp:
/// 421 makes the client refresh our public key and 432 rejects the request.
/// Messages never carry key material or plaintext.
#[derive(Debug, Display, Error, PartialEq)]
pub enum FlowError {
    #[display("request signature did not match")]
    SignatureMismatch,
    #[display("aes key could not be unwrapped: {_0}")]
    AsymmetricUnwrapFailure(#[error(not(source))] String),
    #[display("flow data could not be decrypted: {_0}")]
    SymmetricDecryptFailure(#[error(not(source))] String),
    #[display("decrypted flow data is not a json object: {_0}")]
    PayloadParseFailure(#[error(not(source))] String),
    #[display("response could not be encrypted: {_0}")]
    EncryptFailure(#[error(not(source))] String),
    #[display("challenge could not be signed: {_0}")]
    SigningFailure(#[error(not(source))] String),
    #[display("missing configuration: {_0}")]
    ConfigurationMissing(#[error(not(source))] String),
    #[display("request body is not an encrypted envelope: {_0}")]
    MalformedEnvelope(#[error(not(source))] String),
    #[display("flow logic failed: {_0}")]
    BusinessLogicFailure(#[error(not(source))] String),
}

impl FlowError {
    /// Variant name, used as metric label and log prefix
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::SignatureMismatch => "SignatureMismatch",
            FlowError::AsymmetricUnwrapFailure(_) => "AsymmetricUnwrapFailure",
            FlowError::SymmetricDecryptFailure(_) => "SymmetricDecryptFailure",
            FlowError::PayloadParseFailure(_) => "PayloadParseFailure",
            FlowError::EncryptFailure(_) => "EncryptFailure",
            FlowError::SigningFailure(_) => "SigningFailure",
            FlowError::ConfigurationMissing(_) => "ConfigurationMissing",
            FlowError::MalformedEnvelope(_) => "MalformedEnvelope",
            FlowError::BusinessLogicFailure(_) => "BusinessLogicFailure",
        }
    }

    fn get_error_message(&self) -> String {
        format!("[{}] {self}", self.kind())
    }
}

impl web::error::WebResponseError for FlowError {
    fn error_response(&self, _: &web::HttpRequest) -> web::HttpResponse {
        match self {
            FlowError::SignatureMismatch | FlowError::MalformedEnvelope(_) => {
                logfire::warn!("{error}", error = self.get_error_message());
            }
            _ => {
                logfire::error!("{error}", error = self.get_error_message());
            }
        }

        // no partial bodies: errors go out empty
        web::HttpResponse::build(self.status_code()).finish()
    }

    fn status_code(&self) -> http::StatusCode {
        match *self {
            FlowError::SignatureMismatch => consts::status_code(consts::STATUS_SIGNATURE_MISMATCH),
            FlowError::AsymmetricUnwrapFailure(_) => {
                consts::status_code(consts::STATUS_KEY_UNWRAP_FAILED)
            }
            FlowError::MalformedEnvelope(_) => http::StatusCode::BAD_REQUEST,
            _ => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
